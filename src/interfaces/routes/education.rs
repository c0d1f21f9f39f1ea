use actix_web::web;
use crate::handlers::education;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/education")
            .service(
                web::resource("")
                    .route(web::get().to(education::list_education))
            )
            .service(
                web::resource("/form")
                    .route(web::get().to(education::new_form))
                    .route(web::post().to(education::create_education))
            )
            .service(
                web::resource("/form/check")
                    .route(web::post().to(education::check_form))
            )
            .service(
                web::resource("/form/{id}")
                    .route(web::get().to(education::load_form))
                    .route(web::put().to(education::update_education))
            )
            .service(
                web::resource("/level")
                    .route(web::get().to(education::suggest_level))
            )
            .service(
                web::resource("/suggestions")
                    .route(web::get().to(education::suggestions))
            )
            .service(
                web::resource("/picker")
                    .route(web::get().to(education::picker_options))
            )
    );
}
