//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every handler here awaits the database or the payment processor, so
//! they are all `async`.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use order_relay_engine::{
    db_types::{NewOrder, OrderId},
    order_objects::WebhookOutcome,
    OrderFlowApi,
    OrderManagement,
    PaymentProvider,
};
use yookassa_tools::WebhookNotification;

use crate::{
    data_objects::{
        AckResponse,
        OrderCreatedResponse,
        OrderStatusResponse,
        PaymentResultResponse,
        PaymentSuccessParams,
        ServiceInfo,
    },
    errors::ServerError,
    integrations::yookassa::payment_notice_from_webhook,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

#[get("/")]
pub async fn service_info() -> impl Responder {
    trace!("💻️ Received service info request");
    HttpResponse::Ok().json(ServiceInfo::default())
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(submit_order => Post "/order" impl OrderManagement, PaymentProvider);
/// Route handler for new orders.
///
/// The order is validated and stored, and a payment is opened for its total. The response carries the order id and,
/// depending on the confirmation mode, either a payment page URL to send the customer to, or a confirmation token for
/// the embedded widget.
///
/// If the payment cannot be opened, the order is kept (unpaid, without a payment reference) and a 500 is returned.
pub async fn submit_order<B, P>(
    body: web::Json<NewOrder>,
    api: web::Data<OrderFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    P: PaymentProvider,
{
    let order = body.into_inner();
    debug!("💻️ New order for {} with {} item(s)", order.email, order.items.len());
    let submitted = api.submit_order(order).await.map_err(|e| {
        debug!("💻️ Could not submit order. {e}");
        ServerError::from(e)
    })?;
    info!("💻️ Order #{} accepted", submitted.order_id());
    Ok(HttpResponse::Ok().json(OrderCreatedResponse::from(submitted)))
}

route!(order_status => Get "/order/{order_id}/status" impl OrderManagement, PaymentProvider);
pub async fn order_status<B, P>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    P: PaymentProvider,
{
    let order_id = OrderId(path.into_inner());
    trace!("💻️ GET status for order #{order_id}");
    let order = api.order_status(order_id).await?;
    Ok(HttpResponse::Ok().json(OrderStatusResponse::from(order)))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(payment_success => Post "/payment_success" impl OrderManagement, PaymentProvider);
/// Route handler for customers returning from the payment page.
///
/// The `payment_id` query parameter only identifies the payment. Its status is always fetched from the payment
/// processor before the order is touched.
pub async fn payment_success<B, P>(
    query: web::Query<PaymentSuccessParams>,
    api: web::Data<OrderFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    P: PaymentProvider,
{
    let payment_id = query.into_inner().payment_id;
    debug!("💻️ Customer returned from payment {payment_id}");
    let confirmation = api.confirm_by_redirect(&payment_id).await?;
    Ok(HttpResponse::Ok().json(PaymentResultResponse::from(confirmation)))
}

route!(webhook => Post "" impl OrderManagement, PaymentProvider);
/// Route handler for YooKassa's asynchronous notifications.
///
/// Mounted inside the `/webhook` scope, behind the trusted source guard.
///
/// Anything that was understood, including events and payments we do not care about, is acknowledged with a 200 so
/// that YooKassa stops re-delivering it. A 500 is only returned when the payment could not be verified or the order
/// could not be updated, in which case YooKassa will try again later.
pub async fn webhook<B, P>(
    body: web::Json<WebhookNotification>,
    api: web::Data<OrderFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement,
    P: PaymentProvider,
{
    let notification = body.into_inner();
    info!("💻️ Received webhook {} for {}", notification.event, notification.object.id);
    let notice = payment_notice_from_webhook(notification)?;
    let outcome = api.confirm_by_webhook(notice).await?;
    match outcome {
        WebhookOutcome::MarkedPaid(id) => info!("💻️ Webhook marked order #{id} as paid"),
        WebhookOutcome::MarkedCanceled(id) => info!("💻️ Webhook marked order #{id} as canceled"),
        WebhookOutcome::AlreadyProcessed(id) => debug!("💻️ Webhook for order #{id} was already processed"),
        WebhookOutcome::Ignored(reason) => debug!("💻️ Webhook ignored: {reason}"),
    }
    Ok(HttpResponse::Ok().json(AckResponse::ok()))
}
