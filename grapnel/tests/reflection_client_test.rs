use echo_service::{EchoServiceServer, FILE_DESCRIPTOR_SET};
use echo_service_impl::EchoServiceImpl;
use grapnel::prost_reflect::DescriptorPool;
use grapnel::reflection::client::{ReflectionClient, ReflectionResolveError};
use tonic::Code;
use tonic_reflection::server::v1::ServerReflectionServer;

mod echo_service_impl;

fn setup_reflection_client()
-> ReflectionClient<ServerReflectionServer<impl tonic_reflection::server::v1::ServerReflection>> {
    // Serve the echo-service descriptor set over the reflection protocol
    let reflection_service = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()
        .expect("Failed to setup Reflection Service");

    ReflectionClient::new(reflection_service)
}

#[tokio::test]
async fn test_reflection_client_fetches_service_file_descriptor() {
    let mut client = setup_reflection_client();

    let fd_set = client
        .file_descriptor_set_by_symbol("echo.EchoService")
        .await
        .expect("Failed to fetch file descriptor set by symbol");

    let pool =
        DescriptorPool::from_file_descriptor_set(fd_set).expect("Failed to build descriptor pool");

    let service = pool
        .get_service_by_name("echo.EchoService")
        .expect("Failed to find service in file descriptor");

    assert!(service.methods().all(|m| m.input().name() == "EchoRequest"));
    assert!(
        service
            .methods()
            .all(|m| m.output().name() == "EchoResponse")
    );

    let echo = service.methods().find(|m| m.name() == "Echo").unwrap();

    assert!(!echo.is_client_streaming());
    assert!(!echo.is_server_streaming());
}

#[tokio::test]
async fn test_reflection_symbol_not_found_error() {
    let mut client = setup_reflection_client();

    let result = client
        .file_descriptor_set_by_symbol("non.existent.Service")
        .await;

    assert!(matches!(
        result,
        Err(ReflectionResolveError::ServerStreamFailure(status)) if status.code() == Code::NotFound
    ));
}

#[tokio::test]
async fn test_reflection_list_services() {
    let mut client = setup_reflection_client();

    let services = client.list_services().await.unwrap();

    assert!(services.contains(&"echo.EchoService".to_string()));
    assert!(services.contains(&"grpc.reflection.v1.ServerReflection".to_string()));
}

#[tokio::test]
async fn test_server_does_not_support_reflection() {
    // A server that ONLY hosts the EchoService, with no reflection registered.
    let server = EchoServiceServer::new(EchoServiceImpl);
    let mut client = ReflectionClient::new(server);

    let result = client
        .file_descriptor_set_by_symbol("echo.EchoService")
        .await;

    match result {
        Err(ReflectionResolveError::ServerStreamInitFailed(status)) => {
            assert_eq!(
                status.code(),
                Code::Unimplemented,
                "Expected UNIMPLEMENTED status, but got: {:?}",
                status
            );
        }
        Err(e) => panic!("Expected StreamInitFailed(Unimplemented), got: {:?}", e),
        Ok(_) => panic!("Expected error, but got a descriptor set"),
    }
}
