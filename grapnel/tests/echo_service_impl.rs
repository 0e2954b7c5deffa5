use echo_service::EchoService;
use echo_service::pb::{EchoRequest, EchoResponse};
use tonic::{Request, Response, Status};

/// Echoes the request message back, so response content can be asserted
/// against the payload that was sent.
pub struct EchoServiceImpl;

#[tonic::async_trait]
impl EchoService for EchoServiceImpl {
    async fn echo(&self, req: Request<EchoRequest>) -> Result<Response<EchoResponse>, Status> {
        let message = req.into_inner().message;
        Ok(Response::new(EchoResponse { message }))
    }

    async fn fail(&self, _req: Request<EchoRequest>) -> Result<Response<EchoResponse>, Status> {
        Err(Status::invalid_argument("fail was called"))
    }
}
