#![allow(dead_code, missing_docs, clippy::expect_used)]

use rstest::fixture;
use tracing::info;

use verbcall_core::test_server::TestConsole;

mod stub;
pub use self::stub::*;

pub const ECHO_SCHEMA: &str = r##"{
    "$schema": "http://json-schema.org/draft-07/schema#",
    "$ref": "#/definitions/echo.EchoRequest",
    "definitions": {
        "echo.EchoRequest": {
            "type": "object",
            "properties": { "name": { "type": "string" } },
            "required": []
        }
    }
}"##;

pub fn init_tracing() {
    // should be run once, fail otherwise, we skip that error
    let _ = tracing_subscriber::fmt()
        .pretty()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    info!("Tracing initialized");
}

#[fixture]
pub async fn console() -> TestConsole<StubVerbService> {
    init_tracing();
    match TestConsole::start(StubVerbService).await {
        Ok(console) => console,
        Err(error) => {
            panic!("fail to start the stub verb service: {error:?}");
        }
    }
}
