//! The query pipeline root.
//!
//! One [`Orchestrator`] owns the current [`QueryResult`] and a generation
//! counter. Each submission bumps the generation, replaces the result
//! wholesale, and drives resolve → submit → poll → present in a spawned
//! task. Every mutation of shared state passes a generation check, so a
//! slow pipeline from an earlier submission can finish its network calls
//! without ever touching a newer query's state.

use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use impact_core::{LocationSpec, NetworkData, QueryFailure, QueryResult};
use impact_geocode::{GeocodeError, GeocoderClient};
use impact_query::{PollConfig, QueryClient, QueryError};

use crate::presenter::Presenter;

/// Where the current query is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ResolvingLocations,
    QueryingBackend,
    Polling,
    Presenting,
}

struct SharedState {
    generation: u64,
    phase: Phase,
    result: QueryResult,
}

/// Handle to one submission.
pub struct QueryTicket {
    generation: u64,
    done: oneshot::Receiver<QueryResult>,
}

impl QueryTicket {
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Resolves with the terminal result of this submission, or `None` if a
    /// newer submission superseded it before it finished.
    pub async fn wait(self) -> Option<QueryResult> {
        self.done.await.ok()
    }
}

/// Sequences one query through geocoding, the backend, and the poll loop.
pub struct Orchestrator {
    geocoder: Arc<GeocoderClient>,
    backend: Arc<QueryClient>,
    poll: PollConfig,
    presenter: Arc<dyn Presenter>,
    shared: Arc<Mutex<SharedState>>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        geocoder: GeocoderClient,
        backend: QueryClient,
        poll: PollConfig,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            geocoder: Arc::new(geocoder),
            backend: Arc::new(backend),
            poll,
            presenter,
            shared: Arc::new(Mutex::new(SharedState {
                generation: 0,
                phase: Phase::Idle,
                result: QueryResult::default(),
            })),
        }
    }

    /// Starts a new query, superseding any in-flight one.
    ///
    /// The previous generation's network calls are not aborted — their
    /// results are discarded at the generation check instead.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, client_spec: LocationSpec, server_spec: LocationSpec) -> QueryTicket {
        let (done_tx, done_rx) = oneshot::channel();

        let generation = {
            let mut shared = self.shared.lock().expect("state mutex poisoned");
            shared.generation += 1;
            shared.phase = Phase::ResolvingLocations;
            shared.result = QueryResult::loading();
            shared.generation
        };
        tracing::info!(generation, "query submitted");

        let task = PipelineTask {
            geocoder: Arc::clone(&self.geocoder),
            backend: Arc::clone(&self.backend),
            poll: self.poll.clone(),
            presenter: Arc::clone(&self.presenter),
            shared: Arc::clone(&self.shared),
            generation,
        };
        tokio::spawn(task.run(client_spec, server_spec, done_tx));

        QueryTicket {
            generation,
            done: done_rx,
        }
    }

    /// Current phase and a copy of the current result, for observers.
    #[must_use]
    pub fn snapshot(&self) -> (Phase, QueryResult) {
        let shared = self.shared.lock().expect("state mutex poisoned");
        (shared.phase, shared.result.clone())
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.shared.lock().expect("state mutex poisoned").generation
    }
}

/// How one pipeline run ended.
enum Outcome {
    Done,
    Superseded,
    Failed(QueryFailure),
}

struct PipelineTask {
    geocoder: Arc<GeocoderClient>,
    backend: Arc<QueryClient>,
    poll: PollConfig,
    presenter: Arc<dyn Presenter>,
    shared: Arc<Mutex<SharedState>>,
    generation: u64,
}

impl PipelineTask {
    async fn run(
        self,
        client_spec: LocationSpec,
        server_spec: LocationSpec,
        done: oneshot::Sender<QueryResult>,
    ) {
        match self.drive(&client_spec, &server_spec).await {
            Outcome::Superseded => return,
            Outcome::Done => {
                if !self.commit(Phase::Presenting, |_| {}) {
                    return;
                }
            }
            Outcome::Failed(failure) => {
                tracing::error!(generation = self.generation, error = %failure, "query failed");
                // Terminal error: no network-data visualization, and the
                // caller is free to submit again.
                if !self.commit(Phase::Presenting, |result| {
                    result.network_data = NetworkData::Absent;
                    result.error = Some(failure);
                }) {
                    return;
                }
            }
        }

        let snapshot = {
            let shared = self.shared.lock().expect("state mutex poisoned");
            if shared.generation != self.generation {
                return;
            }
            shared.result.clone()
        };
        self.presenter.present(&snapshot);

        self.commit(Phase::Idle, |_| {});
        let _ = done.send(snapshot);
    }

    async fn drive(&self, client_spec: &LocationSpec, server_spec: &LocationSpec) -> Outcome {
        let (client_loc, server_loc) = match self
            .geocoder
            .resolve_both(client_spec, server_spec)
            .await
        {
            Ok(pair) => pair,
            Err(e) => return Outcome::Failed(geocode_failure(&e)),
        };

        if !self.commit(Phase::QueryingBackend, |result| {
            result.client = Some(client_loc.clone());
            result.server = Some(server_loc.clone());
        }) {
            return Outcome::Superseded;
        }

        let response = match self.backend.submit(&client_loc, &server_loc).await {
            Ok(response) => response,
            Err(e) => return Outcome::Failed(backend_failure(&e)),
        };

        if let Some(message) = response.err {
            return Outcome::Failed(QueryFailure::Query { message });
        }

        match response.network_data {
            NetworkData::Complete(stats) => {
                if self.commit(Phase::QueryingBackend, |result| {
                    result.network_data = NetworkData::Complete(stats.clone());
                }) {
                    Outcome::Done
                } else {
                    Outcome::Superseded
                }
            }
            NetworkData::Partial { job_id } => {
                if !self.commit(Phase::Polling, |result| {
                    result.network_data = NetworkData::Partial {
                        job_id: job_id.clone(),
                    };
                }) {
                    return Outcome::Superseded;
                }
                match self.backend.poll_until_complete(&job_id, &self.poll).await {
                    Ok(stats) => {
                        if self.commit(Phase::Polling, |result| {
                            result.network_data = NetworkData::Complete(stats.clone());
                        }) {
                            Outcome::Done
                        } else {
                            Outcome::Superseded
                        }
                    }
                    Err(e) => Outcome::Failed(poll_failure(&e)),
                }
            }
            NetworkData::Loading | NetworkData::Absent => Outcome::Failed(QueryFailure::Query {
                message: "backend returned no job status".to_owned(),
            }),
        }
    }

    /// Applies `apply` to the shared result if this task's generation is
    /// still the current one. A superseded task gets `false` and must stop
    /// committing.
    fn commit(&self, phase: Phase, apply: impl FnOnce(&mut QueryResult)) -> bool {
        let mut shared = self.shared.lock().expect("state mutex poisoned");
        if shared.generation != self.generation {
            tracing::warn!(
                generation = self.generation,
                current = shared.generation,
                "dropping stale pipeline update"
            );
            return false;
        }
        shared.phase = phase;
        apply(&mut shared.result);
        true
    }
}

fn geocode_failure(err: &GeocodeError) -> QueryFailure {
    match err.endpoint() {
        Some(endpoint) => QueryFailure::Geocode {
            endpoint,
            status: err.status_label(),
        },
        None => QueryFailure::Query {
            message: err.to_string(),
        },
    }
}

fn backend_failure(err: &QueryError) -> QueryFailure {
    QueryFailure::Query {
        message: err.to_string(),
    }
}

fn poll_failure(err: &QueryError) -> QueryFailure {
    QueryFailure::Poll {
        message: err.to_string(),
    }
}
