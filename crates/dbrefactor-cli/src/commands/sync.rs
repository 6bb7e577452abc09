//! Commands that send the plan to the backend: preview, apply, cleanup and code fix.
//!
//! Only `apply` changes the applied set, and only after every backend call it makes has
//! succeeded.

use anyhow::Result;
use colored::Colorize;
use dbrefactor_core::{PlanEntry, has_destructive_ops, mark_applied, pending};
use dbrefactor_storage::AppliedStore;
use serde::Serialize;
use tracing::{info, warn};

use crate::api::{CleanupResponse, CodeFixResult, Connection, GenerationOptions, RefactorResponse};
use crate::cli::{ApplyArgs, CleanupArgs, CodefixArgs, PreviewArgs};
use crate::client::RefactorClient;
use crate::context::AppContext;
use crate::output::{
    print_codefix, print_log, print_sql, print_structured, print_success, print_warning,
};

/// What a successful apply did.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOutcome {
    pub applied: usize,
    pub newly_marked: usize,
    pub refactor: RefactorResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codefix: Option<CodeFixResult>,
}

/// Runs the pending part of `entries` against the database and, unless `skip_codefix`,
/// the code repository. The applied set is saved only when both succeeded; on any error
/// it is left as it was. Returns `None` when nothing is pending.
pub async fn apply_pending(
    client: &RefactorClient,
    store: &dyn AppliedStore,
    root_key: &str,
    connection: &Connection,
    entries: &[PlanEntry],
    options: GenerationOptions,
    skip_codefix: bool,
) -> Result<Option<ApplyOutcome>> {
    let mut applied = store.load(root_key);
    let todo = pending(entries, &applied);
    if todo.is_empty() {
        return Ok(None);
    }
    if has_destructive_ops(&todo) && !options.allow_destructive {
        warn!("pending operations include destructive ones but destructive changes are not allowed");
    }

    let refactor = client
        .run_refactor(connection, &todo, true, root_key, options)
        .await?;
    let codefix = if skip_codefix {
        None
    } else {
        Some(client.run_codefix(&todo, true, root_key, &[], &[]).await?)
    };

    let newly_marked = mark_applied(todo.iter().copied(), &mut applied);
    match store.save(root_key, &applied) {
        Ok(()) => {}
        Err(e) if e.is_unavailable() => {
            warn!(error = %e, "applied operations will not be remembered");
        }
        Err(e) => return Err(e.into()),
    }
    info!(root_key, applied = todo.len(), newly_marked, "apply confirmed");

    Ok(Some(ApplyOutcome {
        applied: todo.len(),
        newly_marked,
        refactor,
        codefix,
    }))
}

/// Cleanup runs over the whole plan. Destructive permission is only forwarded when the
/// plan actually holds a destructive operation.
pub async fn cleanup_plan(
    client: &RefactorClient,
    connection: &Connection,
    entries: &[PlanEntry],
    mut options: GenerationOptions,
) -> Result<CleanupResponse> {
    if options.allow_destructive && !has_destructive_ops(entries) {
        warn!("destructive changes allowed but the plan has no destructive operation");
        options.allow_destructive = false;
    }
    Ok(client.run_cleanup(connection, entries, options).await?)
}

pub async fn preview(ctx: &AppContext, args: &PreviewArgs) -> Result<()> {
    let plan = ctx.load_plan()?;
    let applied = ctx.store().load(&ctx.root_key);
    let ops: Vec<&PlanEntry> = if args.all {
        plan.entries().iter().collect()
    } else {
        pending(plan.entries(), &applied)
    };
    if ops.is_empty() {
        print_success("Nothing to preview: every operation is already applied");
        return Ok(());
    }

    let connection = ctx.connection(&args.connection)?;
    let options = ctx.generation_options(false);
    let response = ctx
        .client()?
        .run_refactor(&connection, &ops, false, &ctx.root_key, options)
        .await?;

    if !print_structured(&response, ctx.format)? {
        println!(
            "{} {} of {} operation(s)",
            "Preview".cyan(),
            ops.len(),
            plan.len()
        );
        print_sql(&response.sql);
        if let Some(codefix) = &response.codefix {
            print_codefix(codefix);
        }
    }
    Ok(())
}

pub async fn apply(ctx: &AppContext, args: &ApplyArgs) -> Result<()> {
    let plan = ctx.load_plan()?;
    let connection = ctx.connection(&args.connection)?;
    let options = ctx.generation_options(args.allow_destructive);
    let store = ctx.store();

    let outcome = apply_pending(
        &ctx.client()?,
        store.as_ref(),
        &ctx.root_key,
        &connection,
        plan.entries(),
        options,
        args.skip_codefix,
    )
    .await?;

    let Some(outcome) = outcome else {
        print_success("Nothing to apply: every operation is already applied");
        return Ok(());
    };
    if !print_structured(&outcome, ctx.format)? {
        print_sql(&outcome.refactor.sql);
        print_log(&outcome.refactor.db_log);
        if let Some(codefix) = &outcome.codefix {
            print_codefix(codefix);
        }
        print_success(&format!(
            "Applied {} operation(s) under {}",
            outcome.applied,
            ctx.root_key.cyan()
        ));
    }
    Ok(())
}

pub async fn cleanup(ctx: &AppContext, args: &CleanupArgs) -> Result<()> {
    let plan = ctx.load_plan()?;
    if plan.is_empty() {
        print_success("Plan is empty, nothing to clean up");
        return Ok(());
    }
    let connection = ctx.connection(&args.connection)?;
    let requested = ctx.generation_options(args.allow_destructive);
    if requested.allow_destructive && !has_destructive_ops(plan.entries()) {
        print_warning("--allow-destructive ignored: the plan has no destructive operation");
    }

    let response = cleanup_plan(&ctx.client()?, &connection, plan.entries(), requested).await?;
    if !print_structured(&response, ctx.format)? {
        print_log(&response.log);
        print_sql(&response.sql);
        print_success("Cleanup finished");
    }
    Ok(())
}

/// Runs the code fixer. Never marks anything applied: that is tied to the database.
pub async fn codefix(ctx: &AppContext, args: &CodefixArgs) -> Result<()> {
    let plan = ctx.load_plan()?;
    let applied = ctx.store().load(&ctx.root_key);
    let ops: Vec<&PlanEntry> = if args.all {
        plan.entries().iter().collect()
    } else {
        pending(plan.entries(), &applied)
    };
    if ops.is_empty() {
        print_success("Nothing to fix: every operation is already applied (use --all)");
        return Ok(());
    }

    let result = ctx
        .client()?
        .run_codefix(
            &ops,
            args.apply,
            &ctx.root_key,
            &args.include_globs,
            &args.exclude_globs,
        )
        .await?;
    if !print_structured(&result, ctx.format)? {
        print_codefix(&result);
        if !args.apply {
            println!("Dry run. Re-run with --apply to write changes.");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientError;
    use dbrefactor_core::{AppliedSet, Operation, Plan, fingerprint};
    use dbrefactor_storage::{MemoryStore, StorageError};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn op(value: serde_json::Value) -> Operation {
        serde_json::from_value(value).unwrap()
    }

    fn plan() -> Plan {
        let mut plan = Plan::new();
        plan.add(op(json!({"scope": "table-rename", "tableFrom": "Brand", "tableTo": "Brands"})))
            .unwrap();
        plan.add(op(json!({"scope": "drop-column", "tableFrom": "Brand", "columnFrom": "Legacy"})))
            .unwrap();
        plan
    }

    fn session() -> Connection {
        Connection::Session {
            session_id: "s-1".to_string(),
        }
    }

    async fn mock_refactor(server: &MockServer, status: u16, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/refactor/run"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn mock_codefix(server: &MockServer, status: u16, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/codefix/run"))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(server)
            .await;
    }

    fn client(server: &MockServer) -> RefactorClient {
        RefactorClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_apply_marks_after_both_calls_succeed() {
        let server = MockServer::start().await;
        mock_refactor(&server, 200, json!({"ok": true, "sql": {"renameSql": "EXEC sp_rename"}})).await;
        mock_codefix(&server, 200, json!({"filesScanned": 3, "filesChanged": 1, "changes": []})).await;

        let store = MemoryStore::new();
        let plan = plan();
        let outcome = apply_pending(
            &client(&server),
            &store,
            "SOLUTION",
            &session(),
            plan.entries(),
            GenerationOptions::default(),
            false,
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(outcome.applied, 2);
        assert_eq!(outcome.newly_marked, 2);
        assert_eq!(outcome.codefix.unwrap().files_changed, 1);
        let applied = store.load("SOLUTION");
        assert!(plan.operations().all(|op| applied.contains(&fingerprint(op))));
    }

    #[tokio::test]
    async fn test_apply_sends_only_pending() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/refactor/run"))
            .and(body_partial_json(json!({
                "plan": {"renames": [{"scope": "drop-column", "columnFrom": "Legacy"}]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let store = MemoryStore::new();
        let plan = plan();
        let mut applied = store.load("SOLUTION");
        applied.insert(fingerprint(&plan.entries()[0].operation));
        store.save("SOLUTION", &applied).unwrap();

        let outcome = apply_pending(
            &client(&server),
            &store,
            "SOLUTION",
            &session(),
            plan.entries(),
            GenerationOptions::default(),
            true,
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(outcome.applied, 1);
        assert!(outcome.codefix.is_none());
        assert_eq!(store.load("SOLUTION").len(), 2);
    }

    #[tokio::test]
    async fn test_backend_failure_leaves_applied_set_untouched() {
        let server = MockServer::start().await;
        mock_refactor(&server, 500, json!({"error": "Timeout expired"})).await;

        let store = MemoryStore::new();
        let plan = plan();
        let err = apply_pending(
            &client(&server),
            &store,
            "SOLUTION",
            &session(),
            plan.entries(),
            GenerationOptions::default(),
            false,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Timeout expired"));
        assert!(store.load("SOLUTION").is_empty());
        assert!(store.raw("dbrefactor.applied.SOLUTION").is_none());
    }

    #[tokio::test]
    async fn test_codefix_failure_leaves_applied_set_untouched() {
        let server = MockServer::start().await;
        mock_refactor(&server, 200, json!({"ok": true})).await;
        mock_codefix(&server, 200, json!({"ok": false, "message": "repository is dirty"})).await;

        let store = MemoryStore::new();
        let plan = plan();
        let err = apply_pending(
            &client(&server),
            &store,
            "SOLUTION",
            &session(),
            plan.entries(),
            GenerationOptions::default(),
            false,
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "repository is dirty");
        assert!(store.load("SOLUTION").is_empty());
    }

    #[tokio::test]
    async fn test_timeout_leaves_applied_set_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/refactor/run"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": true}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;
        mock_codefix(&server, 200, json!({"filesScanned": 0})).await;

        let client = RefactorClient::new(&server.uri(), Duration::from_millis(200)).unwrap();
        let store = MemoryStore::new();
        let plan = plan();
        let err = apply_pending(
            &client,
            &store,
            "SOLUTION",
            &session(),
            plan.entries(),
            GenerationOptions::default(),
            false,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ClientError>(),
            Some(ClientError::Timeout { .. })
        ));
        assert!(store.load("SOLUTION").is_empty());
        assert!(store.raw("dbrefactor.applied.SOLUTION").is_none());
    }

    /// Store whose writes always fail.
    struct FailingStore {
        unavailable: bool,
    }

    impl AppliedStore for FailingStore {
        fn load(&self, _root_key: &str) -> AppliedSet {
            AppliedSet::new()
        }

        fn save(&self, _root_key: &str, _applied: &AppliedSet) -> Result<(), StorageError> {
            if self.unavailable {
                Err(StorageError::unavailable("read-only state directory"))
            } else {
                Err(std::io::Error::other("disk full").into())
            }
        }

        fn clear(&self, _root_key: &str) -> Result<bool, StorageError> {
            Ok(false)
        }

        fn backend_name(&self) -> &'static str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_unavailable_store_still_reports_apply() {
        let server = MockServer::start().await;
        mock_refactor(&server, 200, json!({"ok": true})).await;

        let plan = plan();
        let outcome = apply_pending(
            &client(&server),
            &FailingStore { unavailable: true },
            "SOLUTION",
            &session(),
            plan.entries(),
            GenerationOptions::default(),
            true,
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(outcome.applied, 2);
    }

    #[tokio::test]
    async fn test_other_store_errors_fail_apply() {
        let server = MockServer::start().await;
        mock_refactor(&server, 200, json!({"ok": true})).await;

        let plan = plan();
        let err = apply_pending(
            &client(&server),
            &FailingStore { unavailable: false },
            "SOLUTION",
            &session(),
            plan.entries(),
            GenerationOptions::default(),
            true,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("disk full"));
    }

    #[tokio::test]
    async fn test_nothing_pending_makes_no_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let store = MemoryStore::new();
        let plan = plan();
        let mut applied = store.load("SOLUTION");
        mark_applied(plan.entries(), &mut applied);
        store.save("SOLUTION", &applied).unwrap();

        let outcome = apply_pending(
            &client(&server),
            &store,
            "SOLUTION",
            &session(),
            plan.entries(),
            GenerationOptions::default(),
            false,
        )
        .await
        .unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_cleanup_drops_permission_without_destructive_ops() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/apply/cleanup"))
            .and(body_partial_json(json!({"allowDestructive": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "log": []})))
            .expect(1)
            .mount(&server)
            .await;

        let mut plan = Plan::new();
        plan.add(op(json!({"scope": "table-rename", "tableFrom": "Brand", "tableTo": "Brands"})))
            .unwrap();
        let options = GenerationOptions {
            allow_destructive: true,
            ..GenerationOptions::default()
        };
        cleanup_plan(&client(&server), &session(), plan.entries(), options)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cleanup_forwards_permission_for_drops() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/apply/cleanup"))
            .and(body_partial_json(json!({"allowDestructive": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let options = GenerationOptions {
            allow_destructive: true,
            ..GenerationOptions::default()
        };
        cleanup_plan(&client(&server), &session(), plan().entries(), options)
            .await
            .unwrap();
    }
}
