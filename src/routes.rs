use actix_web::web;

use crate::errors::{json_error_handler, path_error_handler, query_error_handler};
use crate::handlers;

/// Registers the extractor error handlers and every route of the API.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(
            web::scope("/api/users")
                .route("/register", web::post().to(handlers::auth::register))
                .route("/login", web::post().to(handlers::auth::login))
                .route("/verify-email", web::get().to(handlers::auth::verify_email))
                .route("/forgot-password", web::post().to(handlers::auth::forgot_password))
                .service(
                    web::resource("/reset-password")
                        .route(web::get().to(handlers::auth::reset_password_form))
                        .route(web::post().to(handlers::auth::reset_password)),
                )
                .route("/recover-email", web::post().to(handlers::auth::recover_email))
                .service(
                    web::resource("/profile")
                        .route(web::get().to(handlers::profile::get_profile))
                        .route(web::put().to(handlers::profile::update_profile)),
                )
                .route("/delete", web::delete().to(handlers::profile::delete_account))
                .route("/weather", web::get().to(handlers::profile::weather)),
        )
        .service(
            web::scope("/api/clothing")
                .service(
                    web::resource("")
                        .route(web::get().to(handlers::clothing::list_clothing))
                        .route(web::post().to(handlers::file::upload_clothing)),
                )
                .route("/generateOutfit", web::post().to(handlers::outfit::generate_outfit))
                .route("/saveOutfit", web::post().to(handlers::outfit::save_outfit))
                .route("/outfit", web::get().to(handlers::outfit::list_outfits))
                .route("/outfit/{id}", web::delete().to(handlers::outfit::delete_outfit))
                .route(
                    "/{id}/reclassify",
                    web::put().to(handlers::clothing::reclassify_clothing),
                )
                .route("/{id}", web::delete().to(handlers::clothing::delete_clothing)),
        )
        .route("/uploads/{key}", web::get().to(handlers::file::serve_upload));
}
