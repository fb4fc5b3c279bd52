use std::convert::Infallible;

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;

use crate::error::{AppError, AuthError, AuthErrorKind};

use super::AuthCtx;

/// Handler で、 AuthCtx を受け取るための extractor
/// middleware が AuthCtx を request.extensions() に insert 済みである前提
/// 見つからない場合は AuthenticationRequired（ミドルウェア未設定など）
/// `Option<AuthCtxExtractor>` なら見つからなくても reject しない
pub struct AuthCtxExtractor(pub AuthCtx);

impl<S> FromRequestParts<S> for AuthCtxExtractor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthCtx>()
            .cloned()
            .map(AuthCtxExtractor)
            .ok_or_else(|| AuthError::new(AuthErrorKind::AuthenticationRequired).into())
    }
}

impl<S> OptionalFromRequestParts<S> for AuthCtxExtractor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthCtx>().cloned().map(AuthCtxExtractor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(ctx: Option<AuthCtx>) -> Parts {
        let mut req = Request::builder().uri("/mcp").body(()).unwrap();
        if let Some(ctx) = ctx {
            req.extensions_mut().insert(ctx);
        }
        req.into_parts().0
    }

    #[tokio::test]
    async fn test_extracts_attached_context() {
        let mut parts = parts_with(AuthCtx::new("cid1"));
        let AuthCtxExtractor(ctx) =
            <AuthCtxExtractor as FromRequestParts<()>>::from_request_parts(&mut parts, &())
                .await
                .unwrap();
        assert_eq!(ctx.client_id(), "cid1");
    }

    #[tokio::test]
    async fn test_missing_context_rejects_with_401() {
        let mut parts = parts_with(None);
        let result =
            <AuthCtxExtractor as FromRequestParts<()>>::from_request_parts(&mut parts, &()).await;

        match result {
            Err(AppError::Auth(err)) => {
                assert_eq!(err.kind(), AuthErrorKind::AuthenticationRequired)
            }
            _ => panic!("expected AuthenticationRequired"),
        }
    }

    #[tokio::test]
    async fn test_optional_form_yields_none() {
        let mut parts = parts_with(None);
        let result = <AuthCtxExtractor as OptionalFromRequestParts<()>>::from_request_parts(
            &mut parts,
            &(),
        )
        .await
        .unwrap();
        assert!(result.is_none());
    }
}
