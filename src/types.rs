//! Common types used throughout the application

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use color_eyre::eyre::{eyre, Report};
use ratatui::prelude::*;
use serde::{Deserialize, Serialize};

/// Number of apps requested per catalog page
pub const PAGE_SIZE: usize = 15;

/// One entry of an app's rating breakdown (e.g. "5 star" -> 1200)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingEntry {
    #[serde(alias = "label", default)]
    pub name: String,
    #[serde(alias = "value", default)]
    pub count: u64,
}

/// Identifiers arrive as strings or bare numbers depending on the backend
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(i64),
}

impl From<WireId> for String {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Text(s) => s,
            WireId::Number(n) => n.to_string(),
        }
    }
}

/// Shape of an app record as sent by the server
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAppRecord {
    #[serde(rename = "_id")]
    underscore_id: Option<WireId>,
    id: Option<WireId>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    company_name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    size: f64,
    #[serde(default)]
    downloads: u64,
    #[serde(default)]
    rating_avg: f64,
    #[serde(default)]
    reviews: u64,
    #[serde(default)]
    ratings: Vec<RatingEntry>,
}

/// One catalog entry. Owned by the server, read-only on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireAppRecord", rename_all = "camelCase")]
pub struct AppRecord {
    pub id: String,
    pub image: Option<String>,
    pub title: String,
    pub company_name: String,
    pub description: String,
    /// Size in megabytes
    pub size: f64,
    pub downloads: u64,
    pub rating_avg: f64,
    pub reviews: u64,
    pub ratings: Vec<RatingEntry>,
}

impl TryFrom<WireAppRecord> for AppRecord {
    type Error = Report;

    fn try_from(w: WireAppRecord) -> Result<Self, Self::Error> {
        // `_id` is what the installed list was keyed on, so it wins over `id`
        let id = w
            .underscore_id
            .or(w.id)
            .map(String::from)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| eyre!("app record has no `_id` or `id`"))?;
        Ok(Self {
            id,
            image: w.image,
            title: w.title,
            company_name: w.company_name,
            description: w.description,
            size: w.size,
            downloads: w.downloads,
            rating_avg: w.rating_avg,
            reviews: w.reviews,
            ratings: w.ratings,
        })
    }
}

impl AppRecord {
    pub fn size_str(&self) -> String {
        size_str(self.size)
    }

    pub fn downloads_str(&self) -> String {
        count_str(self.downloads)
    }

    pub fn reviews_str(&self) -> String {
        count_str(self.reviews)
    }

    /// Description split into its newline-delimited paragraphs
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.description.split('\n')
    }
}

/// One page of catalog results
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppsPage {
    #[serde(default)]
    pub apps: Vec<AppRecord>,
    #[serde(default)]
    pub total: usize,
}

pub fn size_str(mb: f64) -> String {
    if mb <= 0.0 {
        return String::from("-");
    }
    if mb >= 1024.0 {
        format!("{:.1} GB", mb / 1024.0)
    } else if mb.fract() == 0.0 {
        format!("{mb:.0} MB")
    } else {
        format!("{mb:.1} MB")
    }
}

/// Compact count like "1.2M" or "35K"
pub fn count_str(n: u64) -> String {
    const K: u64 = 1_000;
    const M: u64 = K * 1_000;
    const B: u64 = M * 1_000;

    if n >= B {
        format!("{:.1}B", n as f64 / B as f64)
    } else if n >= M {
        format!("{:.1}M", n as f64 / M as f64)
    } else if n >= K {
        format!("{:.0}K", n as f64 / K as f64)
    } else {
        n.to_string()
    }
}

/// Server-side sort field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Rating,
    #[default]
    Size,
    Downloads,
}

impl SortField {
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Rating => "rating",
            Self::Size => "size",
            Self::Downloads => "downloads",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Rating => "Ratings",
            Self::Size => "Size",
            Self::Downloads => "Downloads",
        }
    }
}

/// Sort direction. `Default` leaves ordering to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Default,
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Default => "",
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(Self::Default),
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(eyre!("unknown sort order '{other}' (expected asc or desc)")),
        }
    }
}

/// Compound sort choice as offered in the sort selector, e.g. `rating-desc`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOption {
    pub field: SortField,
    pub order: SortOrder,
}

impl SortOption {
    pub const fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    const ALL: [SortOption; 6] = [
        Self::new(SortField::Rating, SortOrder::Desc),
        Self::new(SortField::Rating, SortOrder::Asc),
        Self::new(SortField::Size, SortOrder::Desc),
        Self::new(SortField::Size, SortOrder::Asc),
        Self::new(SortField::Downloads, SortOrder::Desc),
        Self::new(SortField::Downloads, SortOrder::Asc),
    ];

    /// Options in selector order
    pub fn all() -> &'static [SortOption] {
        &Self::ALL
    }

    pub fn label(&self) -> String {
        let arrow = match self.order {
            SortOrder::Desc => "High → Low",
            SortOrder::Asc => "Low → High",
            SortOrder::Default => "Default",
        };
        format!("{} : {arrow}", self.field.label())
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.field.as_param(), self.order.as_param())
    }
}

impl FromStr for SortOption {
    type Err = Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, order) = s.split_once('-').unwrap_or((s, ""));
        let field = match field {
            "rating" => SortField::Rating,
            "size" => SortField::Size,
            "downloads" => SortField::Downloads,
            other => return Err(eyre!("unknown sort field '{other}' (expected rating, size or downloads)")),
        };
        Ok(Self { field, order: order.parse()? })
    }
}

/// Which screen is in front
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Catalog,
    Detail,
    Installed,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Catalog => "All Apps",
            Self::Detail => "App Details",
            Self::Installed => "My Installation",
        }
    }
}

/// Input mode of the application
#[derive(Debug, PartialEq, Eq)]
pub enum AppState {
    Browsing,
    Searching, // User is typing a search query
    ConfirmUninstall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Info,
    Error,
}

impl ToastKind {
    pub fn color(&self) -> Color {
        match self {
            Self::Success => Color::Green,
            Self::Info => Color::Cyan,
            Self::Error => Color::LightRed,
        }
    }
}

/// Short-lived notification shown above the status bar
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub shown_at: Instant,
}

impl Toast {
    pub const LIFETIME: Duration = Duration::from_secs(3);

    pub fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            message: message.into(),
            kind,
            shown_at: Instant::now(),
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.shown_at) >= Self::LIFETIME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_option_parses_compound_values() {
        let opt: SortOption = "rating-desc".parse().unwrap();
        assert_eq!(opt, SortOption::new(SortField::Rating, SortOrder::Desc));

        let opt: SortOption = "size".parse().unwrap();
        assert_eq!(opt, SortOption::new(SortField::Size, SortOrder::Default));

        assert!("price-asc".parse::<SortOption>().is_err());
        assert!("size-sideways".parse::<SortOption>().is_err());
    }

    #[test]
    fn every_selector_option_displays_as_its_wire_value() {
        for opt in SortOption::all() {
            let parsed: SortOption = opt.to_string().parse().unwrap();
            assert_eq!(parsed, *opt);
        }
        assert_eq!(SortOption::all()[0].to_string(), "rating-desc");
    }

    #[test]
    fn app_record_accepts_numeric_underscore_id() {
        let json = r#"{
            "_id": 42,
            "title": "Notes",
            "companyName": "Acme",
            "size": 12.5,
            "ratingAvg": 4.4,
            "ratings": [{"name": "1 star", "count": 3}, {"label": "5 star", "value": 90}]
        }"#;
        let app: AppRecord = serde_json::from_str(json).unwrap();
        assert_eq!(app.id, "42");
        assert_eq!(app.company_name, "Acme");
        assert_eq!(app.ratings[1].name, "5 star");
        assert_eq!(app.ratings[1].count, 90);
        assert_eq!(app.downloads, 0);
    }

    #[test]
    fn underscore_id_wins_over_plain_id() {
        let json = r#"{"_id": "abc", "id": 7, "title": "X"}"#;
        let app: AppRecord = serde_json::from_str(json).unwrap();
        assert_eq!(app.id, "abc");

        let json = r#"{"id": 7, "title": "X"}"#;
        let app: AppRecord = serde_json::from_str(json).unwrap();
        assert_eq!(app.id, "7");
    }

    #[test]
    fn objects_without_an_id_are_not_app_records() {
        for json in [r#"{}"#, r#"{"apps": [], "total": 0}"#, r#"{"message": "oops"}"#, r#"{"_id": ""}"#] {
            assert!(serde_json::from_str::<AppRecord>(json).is_err(), "{json} decoded as an app");
        }
        // `null` is still "no such app"
        assert_eq!(serde_json::from_str::<Option<AppRecord>>("null").unwrap(), None);
    }

    #[test]
    fn human_readable_sizes_and_counts() {
        assert_eq!(size_str(0.0), "-");
        assert_eq!(size_str(50.0), "50 MB");
        assert_eq!(size_str(12.5), "12.5 MB");
        assert_eq!(size_str(2048.0), "2.0 GB");
        assert_eq!(count_str(999), "999");
        assert_eq!(count_str(35_000), "35K");
        assert_eq!(count_str(1_200_000), "1.2M");
    }

    #[test]
    fn description_splits_into_paragraphs() {
        let app = AppRecord {
            id: "1".into(),
            image: None,
            title: String::new(),
            company_name: String::new(),
            description: "first\nsecond".into(),
            size: 0.0,
            downloads: 0,
            rating_avg: 0.0,
            reviews: 0,
            ratings: Vec::new(),
        };
        assert_eq!(app.paragraphs().collect::<Vec<_>>(), ["first", "second"]);
    }
}
