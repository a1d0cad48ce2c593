use axum::async_trait;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Form;

use crate::error::ServiceError;

/// Submitted form values in body order, from either a url-encoded or a multipart body.
///
/// File parts of a multipart body are skipped, only plain values are kept.
pub(crate) struct FormFields(pub(crate) Vec<(String, String)>);

#[async_trait]
impl<S> FromRequest<S> for FormFields
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(&req) {
            let Form(fields) = Form::<Vec<(String, String)>>::from_request(req, state).await?;
            return Ok(FormFields(fields));
        }

        let mut multipart = Multipart::from_request(req, state).await?;
        let mut fields = Vec::new();
        while let Some(field) = multipart.next_field().await? {
            if field.file_name().is_some() {
                continue;
            }
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            fields.push((name, field.text().await?));
        }
        Ok(FormFields(fields))
    }
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map_or(false, |content| {
            content
                .to_ascii_lowercase()
                .starts_with("multipart/form-data")
        })
}
