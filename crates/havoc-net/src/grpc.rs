//! Tonic server assembly and the agent's service implementations.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tonic::transport::server::TcpIncoming;
use tonic::transport::Server;
use tonic::{Request, Response, Status};
use tracing::{info, warn};

use havoc_core::{
    OperationResult, Outcome, OutcomeStatus, RecoveryCoordinator, RecoveryReport, TargetKind,
    TargetManager,
};

pub use havoc_schemas::havoc::agent::v1 as proto;

use proto::container_control_server::{ContainerControl, ContainerControlServer};
use proto::health_server::{Health, HealthServer};
use proto::recovery_server::{Recovery, RecoveryServer};
use proto::service_control_server::{ServiceControl, ServiceControlServer};

/// Builder for the agent's gRPC server.
///
/// The shared tracker lives inside the manager and coordinator handed in
/// here; the builder only wires them to the wire surface.
#[derive(Clone)]
pub struct GrpcServerBuilder {
    listen: SocketAddr,
    manager: Arc<TargetManager>,
    coordinator: Arc<RecoveryCoordinator>,
}

impl GrpcServerBuilder {
    /// Create a new builder from the core service dependencies.
    pub fn new(
        listen: SocketAddr,
        manager: Arc<TargetManager>,
        coordinator: Arc<RecoveryCoordinator>,
    ) -> Self {
        Self {
            listen,
            manager,
            coordinator,
        }
    }

    /// Spawn the gRPC server and return a handle for coordinated shutdown.
    pub async fn spawn(self) -> anyhow::Result<GrpcServerHandle> {
        let listener = tokio::net::TcpListener::bind(self.listen).await?;
        let local_addr = listener.local_addr()?;
        info!(address = %local_addr, "grpc control plane listening");

        let services = ServiceControlSvc {
            manager: Arc::clone(&self.manager),
        };
        let containers = ContainerControlSvc {
            manager: Arc::clone(&self.manager),
        };
        let recovery = RecoverySvc {
            coordinator: Arc::clone(&self.coordinator),
        };

        let incoming = TcpIncoming::from_listener(listener, true, None)
            .map_err(|err| anyhow::anyhow!("failed to build grpc incoming listener: {err}"))?;
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let server = Server::builder()
                .add_service(HealthServer::new(HealthSvc))
                .add_service(ServiceControlServer::new(services))
                .add_service(ContainerControlServer::new(containers))
                .add_service(RecoveryServer::new(recovery))
                .serve_with_incoming_shutdown(incoming, async move {
                    let _ = shutdown_rx.changed().await;
                });
            if let Err(err) = server.await {
                warn!(error = %err, "grpc server exited with error");
            }
        });

        Ok(GrpcServerHandle {
            address: local_addr,
            shutdown: shutdown_tx,
            task,
        })
    }
}

/// Handle returned when spawning the gRPC server.
pub struct GrpcServerHandle {
    address: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl GrpcServerHandle {
    /// Socket address the server bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.address
    }

    /// Signal shutdown and await task completion.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        let _ = self.shutdown.send(true);
        match self.task.await {
            Ok(()) => Ok(()),
            Err(err) => Err(anyhow::anyhow!(err)),
        }
    }
}

struct HealthSvc;

#[tonic::async_trait]
impl Health for HealthSvc {
    async fn check(
        &self,
        _request: Request<proto::HealthCheckRequest>,
    ) -> Result<Response<proto::HealthCheckResponse>, Status> {
        Ok(Response::new(proto::HealthCheckResponse {
            status: proto::health_check_response::ServingStatus::Serving as i32,
        }))
    }
}

struct ServiceControlSvc {
    manager: Arc<TargetManager>,
}

#[tonic::async_trait]
impl ServiceControl for ServiceControlSvc {
    async fn start(
        &self,
        request: Request<proto::TargetRequest>,
    ) -> Result<Response<proto::StatusResponse>, Status> {
        let req = request.into_inner();
        let result = self
            .manager
            .start(TargetKind::Service, &req.name, &req.job)
            .await;
        into_status_response(result)
    }

    async fn stop(
        &self,
        request: Request<proto::TargetRequest>,
    ) -> Result<Response<proto::StatusResponse>, Status> {
        let req = request.into_inner();
        let result = self
            .manager
            .stop(TargetKind::Service, &req.name, &req.job)
            .await;
        into_status_response(result)
    }
}

struct ContainerControlSvc {
    manager: Arc<TargetManager>,
}

#[tonic::async_trait]
impl ContainerControl for ContainerControlSvc {
    async fn start(
        &self,
        request: Request<proto::TargetRequest>,
    ) -> Result<Response<proto::StatusResponse>, Status> {
        let req = request.into_inner();
        let result = self
            .manager
            .start(TargetKind::Container, &req.name, &req.job)
            .await;
        into_status_response(result)
    }

    async fn stop(
        &self,
        request: Request<proto::TargetRequest>,
    ) -> Result<Response<proto::StatusResponse>, Status> {
        let req = request.into_inner();
        let result = self
            .manager
            .stop(TargetKind::Container, &req.name, &req.job)
            .await;
        into_status_response(result)
    }
}

struct RecoverySvc {
    coordinator: Arc<RecoveryCoordinator>,
}

#[tonic::async_trait]
impl Recovery for RecoverySvc {
    async fn recover(
        &self,
        _request: Request<proto::RecoverRequest>,
    ) -> Result<Response<proto::RecoverResponse>, Status> {
        let report = self.coordinator.recover().await;
        Ok(Response::new(recover_response_from(report)))
    }
}

/// Map an operation result onto the wire.
///
/// A gRPC call carries either a body or an error status; on failure the
/// error wins, with the envelope message and cause folded into the status
/// text. Recovery is different because its partial results must survive the
/// trip; see the `failures` field on [`proto::RecoverResponse`].
fn into_status_response(result: OperationResult) -> Result<Response<proto::StatusResponse>, Status> {
    match result.error {
        None => Ok(Response::new(status_response_from(result.outcome))),
        Some(error) => Err(Status::internal(format!(
            "{}: {}",
            result.outcome.message, error
        ))),
    }
}

fn status_response_from(outcome: Outcome) -> proto::StatusResponse {
    let status = match outcome.status {
        OutcomeStatus::Success => proto::status_response::Status::Success,
        OutcomeStatus::Fail => proto::status_response::Status::Fail,
    };
    proto::StatusResponse {
        status: status as i32,
        message: outcome.message,
    }
}

fn recover_response_from(report: RecoveryReport) -> proto::RecoverResponse {
    let failures = report
        .failures
        .iter()
        .map(ToString::to_string)
        .collect();
    proto::RecoverResponse {
        responses: report
            .outcomes
            .into_iter()
            .map(status_response_from)
            .collect(),
        failures,
    }
}
