//! Background catalog fetches
//!
//! The UI thread sends `FetchRequest`s and drains `FetchResponse`s each tick;
//! a single worker thread serves only the newest queued request, since any
//! older one would be dropped as stale on arrival anyway.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use tracing::debug;

use crate::catalog::FetchRequest;
use crate::client::CatalogApi;
use crate::types::AppsPage;

#[derive(Debug)]
pub struct FetchResponse {
    pub token: u64,
    pub result: Result<AppsPage, String>,
}

pub struct FetchWorker {
    requests: Option<Sender<FetchRequest>>,
    responses: Receiver<FetchResponse>,
}

impl FetchWorker {
    pub fn spawn<A>(api: A) -> Result<Self>
    where
        A: CatalogApi + Send + 'static,
    {
        let (req_tx, req_rx) = mpsc::channel::<FetchRequest>();
        let (resp_tx, resp_rx) = mpsc::channel();

        thread::Builder::new()
            .name("catalog-fetch".into())
            .spawn(move || {
                while let Ok(mut req) = req_rx.recv() {
                    if let Some(newer) = req_rx.try_iter().last() {
                        debug!(skipped = req.token, latest = newer.token, "coalescing queued fetches");
                        req = newer;
                    }
                    let result = api.fetch_page(&req.query).map_err(|e| format!("{e:#}"));
                    debug!(token = req.token, ok = result.is_ok(), "catalog fetch finished");
                    if resp_tx.send(FetchResponse { token: req.token, result }).is_err() {
                        break;
                    }
                }
            })
            .wrap_err("spawn fetch worker")?;

        Ok(Self {
            requests: Some(req_tx),
            responses: resp_rx,
        })
    }

    pub fn submit(&self, request: FetchRequest) {
        if let Some(tx) = &self.requests
            && tx.send(request).is_err()
        {
            tracing::warn!("fetch worker is gone; request dropped");
        }
    }

    /// All responses that have arrived since the last call
    pub fn drain(&self) -> Vec<FetchResponse> {
        self.responses.try_iter().collect()
    }
}

impl Drop for FetchWorker {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop once any in-flight
        // request returns; the thread is not joined so quitting never waits
        // on the network.
        self.requests.take();
    }
}
