//! Two-phase SET (RFC 3416) for the agent listener.

use crate::engine::EngineResponse;
use crate::error::ErrorStatus;
use crate::handler::{RequestContext, SetResult};
use crate::oid::Oid;
use crate::value::Value;
use crate::varbind::VarBind;
use crate::version::Version;

use super::listener::Listener;

impl Listener {
    /// Handle a SET request.
    ///
    /// 1. **Access**: the request's grant must allow writes.
    /// 2. **Test phase**: `test_set` validates the write without side effects.
    /// 3. **Commit phase**: `commit_set` applies it; the handler re-checks,
    ///    since the entry may have changed in between.
    pub(super) async fn handle_set(
        &self,
        ctx: &RequestContext,
        oid: &Oid,
        value: Option<&Value>,
    ) -> EngineResponse {
        let request_vb = VarBind::new(oid.clone(), value.cloned().unwrap_or(Value::Null));
        let fail = |status: ErrorStatus| EngineResponse::status(status, 1, vec![request_vb.clone()]);

        if !ctx.can_write {
            tracing::debug!(
                snmp.agent_id = %ctx.agent_id,
                snmp.oid = %oid,
                snmp.security_name = %ctx.security_name,
                "SET refused: read-only credentials"
            );
            return fail(if ctx.version == Version::V1 {
                ErrorStatus::ReadOnly
            } else {
                ErrorStatus::NoAccess
            });
        }

        let Some(value) = value.filter(|v| v.type_tag().is_some()) else {
            return fail(if ctx.version == Version::V1 {
                ErrorStatus::BadValue
            } else {
                ErrorStatus::WrongValue
            });
        };

        // ========== PHASE 1: TEST ==========
        let tested = self.handler.test_set(ctx, oid, value).await;
        if !tested.is_ok() {
            tracing::debug!(snmp.oid = %oid, result = ?tested, "SET test failed");
            return fail(tested.to_error_status(ctx.version));
        }

        // ========== PHASE 2: COMMIT ==========
        let committed = self.handler.commit_set(ctx, oid, value).await;
        if committed != SetResult::Ok {
            tracing::warn!(snmp.oid = %oid, result = ?committed, "SET commit failed");
            return fail(committed.to_error_status(ctx.version));
        }

        tracing::info!(
            snmp.agent_id = %ctx.agent_id,
            snmp.oid = %oid,
            snmp.value = %value,
            "SET applied"
        );
        EngineResponse::varbinds(vec![VarBind::new(oid.clone(), value.clone())])
    }
}
