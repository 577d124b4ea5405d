//! App Router

use salvo::Router;

use crate::{carts, checkout, identity, orders};

pub(crate) fn app_router() -> Router {
    Router::new()
        .hoop(identity::handler)
        .push(
            Router::with_path("cart")
                .get(carts::handlers::index::handler)
                .push(
                    Router::with_path("items")
                        .post(carts::handlers::create::handler)
                        .push(
                            Router::with_path("{item}")
                                .patch(carts::handlers::update::handler)
                                .delete(carts::handlers::delete::handler),
                        ),
                ),
        )
        .push(
            Router::with_path("checkout")
                .post(checkout::handlers::commit::handler)
                .push(Router::with_path("validate").post(checkout::handlers::validate::handler))
                .push(Router::with_path("price").post(checkout::handlers::price::handler)),
        )
        .push(
            Router::with_path("orders")
                .get(orders::handlers::index::handler)
                .push(
                    Router::with_path("{order}")
                        .get(orders::handlers::get::handler)
                        .push(Router::with_path("payments").post(orders::handlers::pay::handler))
                        .push(Router::with_path("status").post(orders::handlers::status::handler)),
                ),
        )
}
