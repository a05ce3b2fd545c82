//! AWS Lambda HTTP front end
//!
//! POST a JSON body with the already-parsed extracts (and optionally operator
//! edits and an engine config); each request runs in its own session.

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::Deserialize;
use serde_json::{json, Value};

use readjustment_system::report::{to_json, RunSummary};
use readjustment_system::{
    EngineConfig, ManualAdjustment, RawTable, ReadjustResult, ReadjustmentSession, ReferenceTables,
    SourceTables,
};

#[derive(Debug, Deserialize)]
struct ComputeRequest {
    financial: RawTable,
    census: RawTable,
    #[serde(default)]
    members: Option<RawTable>,
    #[serde(default)]
    edits: Vec<ManualAdjustment>,
    #[serde(default)]
    config: EngineConfig,
}

fn process(request: ComputeRequest) -> ReadjustResult<Value> {
    let mut session = ReadjustmentSession::new(request.config, ReferenceTables::default());
    session.load(&SourceTables::new(request.financial, request.census, request.members))?;
    if !request.edits.is_empty() {
        session.apply_edits(&request.edits)?;
    }

    let editable = session.editable_subset()?;
    let table = session.current().cloned().unwrap_or_default();
    Ok(json!({
        "summary": RunSummary::new(&table, session.engine()),
        "rows": to_json(&table)?,
        "editable": editable,
    }))
}

fn json_response(status: u16, body: &Value) -> Result<Response<Body>, Error> {
    let response = Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))?;
    Ok(response)
}

async fn handler(event: Request) -> Result<Response<Body>, Error> {
    let bytes: &[u8] = event.body().as_ref();
    let request: ComputeRequest = match serde_json::from_slice(bytes) {
        Ok(r) => r,
        Err(e) => {
            log::warn!("Rejected request body: {}", e);
            return json_response(400, &json!({ "error": format!("Invalid request body: {}", e) }));
        }
    };

    match process(request) {
        Ok(payload) => json_response(200, &payload),
        Err(e) => {
            log::warn!("Readjustment failed: {}", e);
            json_response(422, &json!({ "error": e.to_string() }))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    run(service_fn(handler)).await
}
