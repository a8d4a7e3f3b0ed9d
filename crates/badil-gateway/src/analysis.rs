//! The analysis pipeline — from a client frame to a stream of results.
//!
//! Image path: decode base64 → resize/re-encode → vision identification →
//! catalog lookup. Company path skips straight to the lookup. Frames are
//! pushed onto the connection's channel as each stage completes, so the
//! client sees partial results while later stages are still running.
//!
//! Provider error details never reach the client — they are logged here
//! and replaced with generic messages.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::sync::mpsc;
use tracing::{info, warn};

use badil_analyzer::{Identification, parse_identification, prompts};
use badil_core::protocol::{ClientFrame, ServerFrame};
use badil_core::types::InferenceRequest;
use badil_providers::{InferenceBackend, Outcome};

use crate::state::GatewayState;

const GENERIC_FAILURE: &str = "Analysis failed. Please try again.";
const UNAVAILABLE: &str = "Service temporarily unavailable. Please try again later.";

/// Run one analysis request, pushing result frames as they are produced.
pub async fn run_analysis<B: InferenceBackend>(
    state: &GatewayState<B>,
    frame: ClientFrame,
    tx: &mpsc::UnboundedSender<ServerFrame>,
) {
    match frame {
        ClientFrame::Image { image_data } => analyze_image(state, &image_data, tx).await,
        ClientFrame::Company { company_name } => {
            report_company(state, &company_name, None, tx).await
        }
    }
}

async fn analyze_image<B: InferenceBackend>(
    state: &GatewayState<B>,
    image_base64: &str,
    tx: &mpsc::UnboundedSender<ServerFrame>,
) {
    let bytes = match BASE64.decode(image_base64.trim()) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(%e, "Client sent undecodable base64");
            send(tx, ServerFrame::Error("Invalid image payload".into()));
            return;
        }
    };

    let data_uri = match badil_media::prepare_image(
        bytes,
        state.config.max_dimension(),
        state.config.jpeg_quality(),
    )
    .await
    {
        Ok(uri) => uri,
        Err(e) => {
            warn!(%e, "Image preparation failed");
            send(tx, ServerFrame::Error("Unsupported or corrupt image".into()));
            return;
        }
    };

    let request = InferenceRequest::image(prompts::image_analysis(&state.config), data_uri);
    let Some(reply) = invoke_with_deadline(state, &request, tx).await else {
        return;
    };

    match parse_identification(&reply) {
        Ok(Identification::Product {
            brand,
            parent_company,
            product_type,
        }) => {
            // The boycott list keys on the parent where one exists
            // (the brand is checked too via fuzzy containment).
            let lookup = parent_company.as_deref().unwrap_or(&brand);
            info!(%brand, parent = ?parent_company, %product_type, "Identified product");
            send(tx, ServerFrame::Company(brand.clone()));
            send(tx, ServerFrame::ProductType(product_type.clone()));
            report_boycott(state, lookup, &brand, Some(&product_type), tx).await;
        }
        Ok(Identification::NoProduct) => {
            send(
                tx,
                ServerFrame::Error("No product clearly visible in the image".into()),
            );
        }
        Err(e) => {
            warn!(%e, "Vision reply did not parse");
            send(tx, ServerFrame::Error(GENERIC_FAILURE.into()));
        }
    }
}

async fn report_company<B: InferenceBackend>(
    state: &GatewayState<B>,
    company: &str,
    product_type: Option<&str>,
    tx: &mpsc::UnboundedSender<ServerFrame>,
) {
    send(tx, ServerFrame::Company(company.to_string()));
    report_boycott(state, company, company, product_type, tx).await;
}

async fn report_boycott<B: InferenceBackend>(
    state: &GatewayState<B>,
    lookup: &str,
    brand: &str,
    product_type: Option<&str>,
    tx: &mpsc::UnboundedSender<ServerFrame>,
) {
    let hit = state
        .catalog
        .find_boycott(lookup)
        .or_else(|| state.catalog.find_boycott(brand));

    let Some((company, _score)) = hit else {
        send(tx, ServerFrame::Boycott(false));
        return;
    };

    send(tx, ServerFrame::Boycott(true));

    if let Some(cause) = company.cause.clone() {
        let restyled = restyle_cause(state, &cause).await;
        send(tx, ServerFrame::Cause(restyled));
    }

    if let Some(product_type) = product_type {
        let alternatives = state.catalog.alternatives_for(&company.name, product_type);
        if !alternatives.is_empty() {
            send(tx, ServerFrame::Alternative(alternatives));
        }
    }
}

/// Pass the stored cause back through the engine for restyling; any
/// failure falls back to the raw stored text.
async fn restyle_cause<B: InferenceBackend>(state: &GatewayState<B>, cause: &str) -> String {
    let request = InferenceRequest::text(prompts::text_generation(&state.config), cause);
    let deadline = Duration::from_secs(state.config.inference_timeout_secs());

    match tokio::time::timeout(deadline, state.engine.invoke(&request)).await {
        Ok(Ok(Outcome::Text(text))) => text,
        Ok(Ok(Outcome::Unavailable)) => cause.to_string(),
        Ok(Err(e)) => {
            warn!(%e, "Cause restyling failed; using stored text");
            cause.to_string()
        }
        Err(_) => {
            warn!("Cause restyling timed out; using stored text");
            cause.to_string()
        }
    }
}

/// Invoke the engine under the transport deadline. Emits the appropriate
/// terminal frame and returns `None` when there is no text to continue
/// with.
async fn invoke_with_deadline<B: InferenceBackend>(
    state: &GatewayState<B>,
    request: &InferenceRequest,
    tx: &mpsc::UnboundedSender<ServerFrame>,
) -> Option<String> {
    let secs = state.config.inference_timeout_secs();

    match tokio::time::timeout(Duration::from_secs(secs), state.engine.invoke(request)).await {
        Ok(Ok(Outcome::Text(text))) => Some(text),
        Ok(Ok(Outcome::Unavailable)) => {
            send(tx, ServerFrame::Unavailable(UNAVAILABLE.into()));
            None
        }
        Ok(Err(e)) => {
            warn!(%e, "Inference failed");
            send(tx, ServerFrame::Error(GENERIC_FAILURE.into()));
            None
        }
        Err(_) => {
            warn!(timeout_secs = secs, "Inference call exceeded deadline");
            send(
                tx,
                ServerFrame::Error(format!("Request timed out after {secs} seconds")),
            );
            None
        }
    }
}

fn send(tx: &mpsc::UnboundedSender<ServerFrame>, frame: ServerFrame) {
    // A closed channel just means the client went away mid-analysis.
    let _ = tx.send(frame);
}
