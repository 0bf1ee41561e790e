/*!
 * 基于能力的访问控制中间件
 *
 * 必须在 RequireContext 之后使用，检查上下文中是否具备指定能力。
 *
 * ```rust,ignore
 * .wrap(RequireCapability::new(Capability::ManageActivity))
 * .wrap(RequireCapability::new_any(&[Capability::ViewAllSubmissions, Capability::Submit]))
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::info;

use super::create_error_response;
use crate::models::ErrorCode;
use crate::models::context::{Capability, RequestContext};

#[derive(Clone)]
pub struct RequireCapability {
    required: Vec<Capability>,
}

impl RequireCapability {
    pub fn new(capability: Capability) -> Self {
        Self {
            required: vec![capability],
        }
    }

    /// 具备任一能力即可
    pub fn new_any(capabilities: &[Capability]) -> Self {
        Self {
            required: capabilities.to_vec(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireCapability
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireCapabilityMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireCapabilityMiddleware {
            service: Rc::new(service),
            required: self.required.clone(),
        }))
    }
}

pub struct RequireCapabilityMiddleware<S> {
    service: Rc<S>,
    required: Vec<Capability>,
}

impl<S, B> Service<ServiceRequest> for RequireCapabilityMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let required = self.required.clone();

        Box::pin(async move {
            let context = req.extensions().get::<RequestContext>().cloned();

            match context {
                Some(context) if context.has_any(&required) => {
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Some(context) => {
                    info!(
                        "Access denied for user {}. Required any of: {:?}",
                        context.user_id, required
                    );
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::FORBIDDEN,
                            ErrorCode::Forbidden,
                            "Access denied.",
                        )
                        .map_into_right_body(),
                    ))
                }
                None => {
                    info!(
                        "Capability check failed: no request context. Make sure RequireContext is applied first."
                    );
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::UNAUTHORIZED,
                            ErrorCode::Unauthorized,
                            "Authentication required",
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}
