use axum::http::header;

use super::base::{BaseLdpHandler, READ_ONLY_METHODS};
use super::response::ResponseBuilder;
use crate::api::LdpError;
use crate::api::request::TrellisRequest;
use crate::model::InteractionModel;
use crate::services::ServiceBundler;

pub async fn handle(request: &TrellisRequest, services: &ServiceBundler) -> Result<ResponseBuilder, LdpError> {
    let internal = request.internal_id();
    let lookup = match request.version() {
        Some(version) => services.mementos.get(&internal, version.instant()).await?,
        None => services.resources.get(&internal).await?,
    };

    let mut base = BaseLdpHandler::new(request, services);
    let model = base.initialize(None, lookup, InteractionModel::Resource)?.interaction_model;

    let builder = base.type_links(ResponseBuilder::no_content(), model);
    if request.version().is_some() || request.is_timemap() {
        return Ok(builder.header(header::ALLOW, READ_ONLY_METHODS.join(",")));
    }
    Ok(base.allow_headers(builder, model))
}
