use axum::Json;
use axum_extra::extract::cookie::CookieJar;

use crate::utils::flash::{self, FlashResponse};

#[utoipa::path(
    get,
    path = "/",
    tag = "Flash",
    operation_id = "takeFlashMessages",
    summary = "Take pending flash messages",
    description = "Returns the messages queued by earlier redirects and clears them.",
    responses(
        (status = 200, description = "Pending messages, oldest first", body = FlashResponse),
    ),
)]
pub async fn take_flash(jar: CookieJar) -> (CookieJar, Json<FlashResponse>) {
    let (jar, messages) = flash::take(jar);
    (jar, Json(FlashResponse { messages }))
}
