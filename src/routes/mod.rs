use axum::{middleware, Router};

use crate::{
    middlewares::mw_auth::{mw_auth, mw_require_admin},
    AppState,
};

use self::{
    admin_routes::AdminRoutes, comment_routes::CommentRoutes, favorite_routes::FavoriteRoutes,
    play_routes::PlayRoutes,
};

pub mod admin_routes;
pub mod comment_routes;
pub mod favorite_routes;
pub mod play_routes;

/// Every ledger route under `/api`, with session and admin gates applied.
pub fn api_router(app_state: AppState) -> Router {
    let public_routes = Router::new()
        .nest("/comments", CommentRoutes::routes())
        .nest("/plays", PlayRoutes::routes());

    let protected_routes = Router::new()
        .nest("/comments", CommentRoutes::protected_routes())
        .nest("/plays", PlayRoutes::protected_routes())
        .nest("/favorites", FavoriteRoutes::routes())
        .route_layer(middleware::from_fn_with_state(app_state.clone(), mw_auth));

    let admin_routes = Router::new()
        .nest("/admin", AdminRoutes::routes())
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_require_admin,
        ))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), mw_auth));

    let routes_api = public_routes.merge(protected_routes).merge(admin_routes);

    Router::new().nest("/api", routes_api).with_state(app_state)
}
