//! GLEC Admin - binary entry point
//! Delegates to the library for all app logic.

#[tokio::main]
async fn main() {
    glec_admin::run().await;
}
