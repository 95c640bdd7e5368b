use askama::Template;
use askama_web::WebTemplate;

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub url: String,
    pub state: String,
    pub connections: u64,
    pub policy: String,
    pub altitude_unit: String,
    pub session: Option<SessionView>,
}

pub struct SessionView {
    pub id: String,
    pub anchor: String,
    pub track_len: usize,
    pub clock_time: String,
    pub playback: String,
    pub animating: bool,
    pub accepted: u64,
    pub rejected: u64,
    pub out_of_order: u64,
    pub position: String,
}
