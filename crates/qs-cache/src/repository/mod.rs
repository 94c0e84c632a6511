//! Cached repository decorators.
//!
//! Each decorator implements the full repository trait of its aggregate.
//! Identifier lookups go through the cache, writes hit the inner repository
//! first and then invalidate, and everything else passes straight through.
//! Cache failures are logged and never surface to the caller.

mod assessment;
mod assessment_list;
mod assessment_status;
mod plan;
mod questionnaire;
mod scale;
mod scale_list;
mod testee;

pub use assessment::CachedAssessmentRepository;
pub use assessment_list::{AssessmentList, MyAssessmentListCache};
pub use assessment_status::{AssessmentStatusCache, AssessmentStatusView};
pub use plan::CachedPlanRepository;
pub use questionnaire::CachedQuestionnaireRepository;
pub use scale::CachedScaleRepository;
pub use scale_list::{published_conditions, ScaleListCache, ScaleListSnapshot, PAGE_MEMO_TTL, REBUILD_PAGE_SIZE};
pub use testee::CachedTesteeRepository;
