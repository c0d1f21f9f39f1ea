use actix_web::web;

use crate::handlers::home::home;

mod admin;
mod education;
mod json_error;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home);

    cfg.configure(education::config_routes)
        .configure(admin::config_routes);

    cfg.configure(json_error::config_routes);
}
