use db::{DBService, DbErr};
use services::services::{
    assignment::AssignmentService, job_queue::JobQueueService,
    response_cache::ResponseCacheService,
};

/// Composition root shared across every request handler.
#[derive(Clone)]
pub struct Deployment {
    db: DBService,
    assignments: AssignmentService,
    job_queue: JobQueueService,
}

impl Deployment {
    pub async fn new(database_url: &str) -> Result<Deployment, DbErr> {
        let db = DBService::new(database_url).await?;
        let assignments = AssignmentService::new(db.clone(), ResponseCacheService::new());
        Ok(Deployment {
            db,
            assignments,
            job_queue: JobQueueService::new(),
        })
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn assignments(&self) -> &AssignmentService {
        &self.assignments
    }

    pub fn job_queue(&self) -> &JobQueueService {
        &self.job_queue
    }
}
