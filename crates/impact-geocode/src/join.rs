//! Two-endpoint concurrent resolution.

use impact_core::{LocationSpec, ResolvedLocation};

use crate::client::GeocoderClient;
use crate::error::GeocodeError;

impl GeocoderClient {
    /// Resolves the client and server specs concurrently and returns the
    /// pair once both have completed.
    ///
    /// Both lookups are in flight before either finishes, and both always
    /// run to completion — a failure on one side never leaves the other
    /// dangling. The merged pair is independent of completion order.
    ///
    /// # Errors
    ///
    /// Returns the failing lookup's [`GeocodeError`]. When both fail, the
    /// client endpoint's error is reported and the server's is logged and
    /// dropped.
    pub async fn resolve_both(
        &self,
        client_spec: &LocationSpec,
        server_spec: &LocationSpec,
    ) -> Result<(ResolvedLocation, ResolvedLocation), GeocodeError> {
        let (client_loc, server_loc) = tokio::join!(
            self.resolve(impact_core::Endpoint::Client, client_spec),
            self.resolve(impact_core::Endpoint::Server, server_spec),
        );

        match (client_loc, server_loc) {
            (Ok(client), Ok(server)) => Ok((client, server)),
            (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(e),
            (Err(client_err), Err(server_err)) => {
                tracing::warn!(
                    error = %server_err,
                    "server geocode also failed; reporting the client error"
                );
                Err(client_err)
            }
        }
    }
}
