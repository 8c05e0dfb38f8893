use std::path::PathBuf;

use relay::InputGateway;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) gateway: InputGateway,
    pub(crate) index_html_path: PathBuf,
}
