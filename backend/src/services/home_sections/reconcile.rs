//! Catalog-wide registry reconciliation as a background job.
//!
//! `POST /reconcile` registers a job, answers with its id right away and runs
//! the work on the blocking pool. Progress flows from the worker through a
//! per-job channel into the job controller; clients poll `GET /jobs/{job_id}`.

use crate::catalog::HomeCatalog;
use crate::job_controller::state::{JobUpdate, JobsState};
use crate::services::reply;
use actix_web::{web, Responder};
use catalog_common::jobs::JobStatus;
use catalog_common::requests::{JobStarted, ReconcileRequest};
use catalog_common::response::{ApiResult, ErrorKind};
use log::info;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

pub(crate) async fn start(
    catalog: web::Data<HomeCatalog>,
    jobs: web::Data<JobsState>,
    payload: Option<web::Json<ReconcileRequest>>,
) -> impl Responder {
    let candidates = payload.and_then(|p| p.into_inner().candidates);
    let job_id = schedule_reconcile_job(catalog.into_inner(), jobs, candidates).await;
    reply(ApiResult::ok("Reconcile job started", JobStarted { job_id }))
}

/// `GET /jobs/{job_id}`: the current `JobStatus`, or 404 for an unknown id.
pub(crate) async fn status(jobs: web::Data<JobsState>, path: web::Path<String>) -> impl Responder {
    let job_id = path.into_inner();
    match jobs.status(&job_id).await {
        Some(status) => reply(ApiResult::ok("Job status", status)),
        None => reply(ApiResult::<JobStatus>::failure(
            ErrorKind::NotFound,
            format!("Job {} not found", job_id),
        )),
    }
}

/// Schedules the catalog-wide reconcile to run in the background.
///
/// The job is registered as `Pending` before this returns. A spawned task runs
/// `HomeCatalog::reconcile_all` on the blocking pool, forwards its percentages
/// as `InProgress` updates and finally reports `Completed` with the JSON
/// `ReconcileSummary`, or `Failed`.
///
/// # Arguments
/// * `catalog` - The shared catalog.
/// * `jobs` - The job controller state the status is published to.
/// * `candidates` - Section ids to probe in every category; `None` uses the configured list.
///
/// # Returns
/// The new `job_id`.
async fn schedule_reconcile_job(
    catalog: Arc<HomeCatalog>,
    jobs: web::Data<JobsState>,
    candidates: Option<Vec<String>>,
) -> String {
    let job_id = Uuid::new_v4().to_string();
    jobs.register(&job_id).await;
    info!("Scheduled reconcile job {}", job_id);

    let tx = jobs.tx.clone();
    let job_id_clone = job_id.clone();

    tokio::spawn(async move {
        let (progress_tx, mut progress_rx) = mpsc::channel::<u32>(100);

        // Forwards percentages from the worker to the job controller.
        let forward_tx = tx.clone();
        let forward_id = job_id_clone.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(percent) = progress_rx.recv().await {
                let _ = forward_tx
                    .send(JobUpdate {
                        job_id: forward_id.clone(),
                        status: JobStatus::InProgress(percent),
                    })
                    .await;
            }
        });

        let handle = tokio::task::spawn_blocking(move || {
            let _ = progress_tx.blocking_send(0);
            catalog.reconcile_all(candidates.as_deref(), |done, total| {
                let percent = if total > 0 {
                    (done as f32 / total as f32 * 100.0) as u32
                } else {
                    100
                };
                let _ = progress_tx.blocking_send(percent);
            })
        });

        let status = match handle.await {
            Ok(Ok(summary)) => match serde_json::to_string(&summary) {
                Ok(json) => JobStatus::Completed(json),
                Err(e) => JobStatus::Failed(e.to_string()),
            },
            Ok(Err(e)) => JobStatus::Failed(e.to_string()),
            Err(e) => JobStatus::Failed(format!("Task join error: {}", e)),
        };

        // The last progress update must not land after the final status.
        let _ = forwarder.await;
        info!("Reconcile job {} finished: {:?}", job_id_clone, status);
        let _ = tx
            .send(JobUpdate {
                job_id: job_id_clone,
                status,
            })
            .await;
    });

    job_id
}

#[cfg(test)]
mod tests {
    use crate::services::home_sections::testing::test_app;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use catalog_common::model::report::ReconcileSummary;
    use serde_json::{json, Value};
    use std::time::Duration;

    #[actix_web::test]
    async fn reconcile_job_runs_to_completion() {
        let app = test_app!();
        let req = test::TestRequest::put()
            .uri("/api/home-sections/categories/home")
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/home-sections/reconcile")
            .set_json(json!({"candidates": ["flashSale"]}))
            .to_request();
        let started: Value = test::call_and_read_body_json(&app, req).await;
        let job_id = started["data"]["jobId"].as_str().unwrap().to_string();

        let uri = format!("/api/home-sections/jobs/{}", job_id);
        let mut last = Value::Null;
        for _ in 0..200 {
            let req = test::TestRequest::get().uri(&uri).to_request();
            last = test::call_and_read_body_json(&app, req).await;
            if last["data"].get("Completed").is_some() {
                break;
            }
            actix_web::rt::time::sleep(Duration::from_millis(10)).await;
        }

        let summary: ReconcileSummary =
            serde_json::from_str(last["data"]["Completed"].as_str().unwrap()).unwrap();
        assert_eq!(summary.categories, 1);
        assert_eq!(summary.failed, 0);
    }

    #[actix_web::test]
    async fn unknown_job_is_404() {
        let app = test_app!();
        let req = test::TestRequest::get()
            .uri("/api/home-sections/jobs/missing")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
