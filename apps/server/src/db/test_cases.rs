//! Test case queries. Steps, defect links and evidence are stored as JSONB.

use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait};

use super::{DbPool, db_error, from_json, parse_code, to_json};
use crate::entity::test_case::{self, Entity as TestCaseEntity};
use crate::error::{AppError, AppResult};
use crate::models::{TestCase, TestCaseStatus, TestCaseUpdate, timestamp};
use crate::store::TestCaseStore;

fn to_active(c: &TestCase) -> AppResult<test_case::ActiveModel> {
    let cycle = i32::try_from(c.cycle)
        .map_err(|_| AppError::InvalidInput(format!("cycle {} is out of range", c.cycle)))?;

    Ok(test_case::ActiveModel {
        id: Set(c.id.clone()),
        project_id: Set(c.project_id.clone()),
        test_plan_id: Set(c.test_plan_id.clone()),
        user_story_id: Set(c.user_story_id.clone()),
        code: Set(c.code.clone()),
        title: Set(c.title.clone()),
        steps: Set(to_json(&c.steps, "test_cases.steps")?),
        expected_result: Set(c.expected_result.clone()),
        test_type: Set(c.test_type.clone()),
        status: Set(c.status.as_str().to_string()),
        cycle: Set(cycle),
        defect_ids: Set(to_json(&c.defect_ids, "test_cases.defect_ids")?),
        evidence: Set(to_json(&c.evidence, "test_cases.evidence")?),
        responsible: Set(c.responsible.clone()),
        created_at: Set(c.created_at),
        updated_at: Set(c.updated_at),
    })
}

fn to_domain(model: test_case::Model) -> AppResult<TestCase> {
    let cycle = u32::try_from(model.cycle)
        .map_err(|_| AppError::Database(format!("Invalid cycle for test case {}", model.id)))?;

    Ok(TestCase {
        status: parse_code(&model.status, "test case status", TestCaseStatus::parse)?,
        steps: from_json(model.steps, "test_cases.steps")?,
        defect_ids: from_json(model.defect_ids, "test_cases.defect_ids")?,
        evidence: from_json(model.evidence, "test_cases.evidence")?,
        cycle,
        id: model.id,
        project_id: model.project_id,
        test_plan_id: model.test_plan_id,
        user_story_id: model.user_story_id,
        code: model.code,
        title: model.title,
        expected_result: model.expected_result,
        test_type: model.test_type,
        responsible: model.responsible,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

#[async_trait]
impl TestCaseStore for DbPool {
    async fn create_test_case(&self, case: &TestCase) -> AppResult<TestCase> {
        TestCaseEntity::insert(to_active(case)?)
            .exec_without_returning(self.connection())
            .await
            .map_err(db_error("insert test case"))?;
        Ok(case.clone())
    }

    async fn get_test_case(&self, id: &str) -> AppResult<Option<TestCase>> {
        TestCaseEntity::find_by_id(id.to_string())
            .one(self.connection())
            .await
            .map_err(db_error("get test case"))?
            .map(to_domain)
            .transpose()
    }

    async fn list_test_cases(&self) -> AppResult<Vec<TestCase>> {
        TestCaseEntity::find()
            .order_by_asc(test_case::Column::CreatedAt)
            .order_by_asc(test_case::Column::Id)
            .all(self.connection())
            .await
            .map_err(db_error("list test cases"))?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn list_test_cases_by_project(&self, project_id: &str) -> AppResult<Vec<TestCase>> {
        TestCaseEntity::find()
            .filter(test_case::Column::ProjectId.eq(project_id))
            .order_by_asc(test_case::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(db_error("list test cases by project"))?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn list_test_cases_by_plan(&self, test_plan_id: &str) -> AppResult<Vec<TestCase>> {
        TestCaseEntity::find()
            .filter(test_case::Column::TestPlanId.eq(test_plan_id))
            .order_by_asc(test_case::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(db_error("list test cases by plan"))?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn update_test_case(
        &self,
        id: &str,
        update: &TestCaseUpdate,
    ) -> AppResult<Option<TestCase>> {
        let Some(mut case) = self.get_test_case(id).await? else {
            return Ok(None);
        };
        update.apply(&mut case, timestamp());

        TestCaseEntity::update_many()
            .set(to_active(&case)?)
            .filter(test_case::Column::Id.eq(id))
            .exec(self.connection())
            .await
            .map_err(db_error("update test case"))?;

        Ok(Some(case))
    }

    async fn delete_test_case(&self, id: &str) -> AppResult<bool> {
        let result = TestCaseEntity::delete_by_id(id.to_string())
            .exec(self.connection())
            .await
            .map_err(db_error("delete test case"))?;
        Ok(result.rows_affected > 0)
    }

    async fn put_test_case(&self, case: &TestCase) -> AppResult<()> {
        let txn = self.connection().begin().await.map_err(db_error("begin transaction"))?;
        TestCaseEntity::delete_by_id(case.id.clone())
            .exec(&txn)
            .await
            .map_err(db_error("replace test case"))?;
        TestCaseEntity::insert(to_active(case)?)
            .exec_without_returning(&txn)
            .await
            .map_err(db_error("insert test case"))?;
        txn.commit().await.map_err(db_error("commit test case"))?;
        Ok(())
    }
}
