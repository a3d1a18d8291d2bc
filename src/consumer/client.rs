//! Echo client bound to a mesh connection.

use tonic::Status;

use crate::mesh::MeshConnection;
use crate::pb::{EchoRequest, EchoServerClient};

/// Issues `Echo` calls through a [`MeshConnection`].
#[derive(Debug, Clone)]
pub struct EchoClient {
    conn: MeshConnection,
}

impl EchoClient {
    pub fn new(conn: MeshConnection) -> Self {
        Self { conn }
    }

    /// Send `value` and return the echoed payload.
    pub async fn echo(&self, value: &str) -> Result<String, Status> {
        let request = EchoRequest {
            value: value.to_string(),
        };
        self.conn
            .invoke(|channel| async move {
                let mut client = EchoServerClient::new(channel);
                client.echo(request).await.map(|resp| resp.into_inner().value)
            })
            .await
    }
}
