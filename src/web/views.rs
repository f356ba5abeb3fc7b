use super::prelude::*;

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub(crate) struct IndexTemplate {
    pub(crate) placeholder_url: String,
}

/// handles the / GET
pub(crate) async fn root_handler(State(state): State<AppState>) -> IndexTemplate {
    IndexTemplate {
        placeholder_url: state.orchestrator.store().placeholder_url(),
    }
}
