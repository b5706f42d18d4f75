//! Source address guard for Actix Web.
//!
//! YooKassa does not sign its webhook notifications. Instead, it publishes the address ranges it sends them from, and
//! merchants are expected to drop anything that comes from elsewhere.
//!
//! Wrap the webhook scope with [`TrustedSourceMiddlewareFactory`] to reject calls from outside the configured
//! [`TrustedNetworks`] with a 403, before the request body is read. If the remote address cannot be determined, the
//! call is rejected as well.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::LocalBoxFuture;
use log::{debug, trace, warn};
use relay_common::TrustedNetworks;

use crate::{config::ServerOptions, errors::ServerError, helpers::get_remote_ip};

pub struct TrustedSourceMiddlewareFactory {
    // If None, then the middleware will not check the source address and always allow the call
    networks: Option<Rc<TrustedNetworks>>,
    options: ServerOptions,
}

impl TrustedSourceMiddlewareFactory {
    pub fn new(networks: Option<TrustedNetworks>, options: ServerOptions) -> Self {
        TrustedSourceMiddlewareFactory { networks: networks.map(Rc::new), options }
    }
}

impl<S, B> Transform<S, ServiceRequest> for TrustedSourceMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = TrustedSourceMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TrustedSourceMiddlewareService {
            networks: self.networks.clone(),
            options: self.options,
            service: Rc::new(service),
        }))
    }
}

pub struct TrustedSourceMiddlewareService<S> {
    networks: Option<Rc<TrustedNetworks>>,
    options: ServerOptions,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for TrustedSourceMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let Some(networks) = self.networks.clone() else {
            trace!("🛡️ Source checks are disabled. Allowing request.");
            return Box::pin(async move { service.call(req).await });
        };
        let peer_ip = get_remote_ip(req.request(), self.options);
        Box::pin(async move {
            match peer_ip {
                Some(ip) if networks.is_trusted_source(&ip) => {
                    debug!("🛡️ Request to {} from trusted source {ip} ✅️", req.path());
                    service.call(req).await
                },
                Some(ip) => {
                    warn!("🛡️ Request to {} from untrusted source {ip}. Denying access.", req.path());
                    Err(ServerError::ForbiddenPeer(format!("{ip} is not a trusted source")).into())
                },
                None => {
                    warn!("🛡️ No remote address found for request to {}. Denying access.", req.path());
                    Err(ServerError::ForbiddenPeer("The remote address could not be determined".into()).into())
                },
            }
        })
    }
}
