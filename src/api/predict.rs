use anyhow::{anyhow, Result};
use axum::extract::{FromRequest, Request, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::api::AppState;
use crate::bail_service;
use crate::currency::format_currency;
use crate::error::{ServiceError, ServiceResult};
use crate::extractors::FormFields;
use crate::pipeline::{EmployeeRecord, SalaryEstimator};

pub const MODEL_NOT_LOADED: &str = "Model is not loaded. Cannot make predictions.";

#[derive(Deserialize, Serialize, Debug)]
pub struct PredictionResponse {
    pub predicted_salary: String,
}

/// Accepts url-encoded and multipart form bodies. The body is only read once a
/// model is known to be loaded.
#[axum_macros::debug_handler]
pub(crate) async fn handle_predict(
    State(state): State<AppState>,
    request: Request,
) -> ServiceResult<Json<PredictionResponse>> {
    let Some(predictor) = state.model.predictor() else {
        bail_service!(StatusCode::INTERNAL_SERVER_ERROR, MODEL_NOT_LOADED);
    };

    let fields = FormFields::from_request(request, &state).await;
    match predict_salary(predictor, fields) {
        Ok(predicted_salary) => Ok(Json(PredictionResponse { predicted_salary })),
        Err(err) => {
            error!("An error occurred during prediction: {:#}", err);
            bail_service!(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred on the server: {}",
                err
            );
        }
    }
}

fn predict_salary(
    predictor: &dyn SalaryEstimator,
    fields: Result<FormFields, ServiceError>,
) -> Result<String> {
    let FormFields(fields) = fields.map_err(|rejection| anyhow!(rejection.message.error))?;
    let record = EmployeeRecord::from_form(&fields)?;
    info!("Received data for prediction: {}", record);

    let estimate = predictor.estimate(&record)?;
    format_currency(estimate)
}
