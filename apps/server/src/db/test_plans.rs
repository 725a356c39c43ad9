//! Test plan queries. Cycles are stored as JSONB.

use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait};

use super::{DbPool, db_error, from_json, to_json};
use crate::entity::test_plan::{self, Entity as TestPlanEntity};
use crate::error::AppResult;
use crate::models::{TestPlan, TestPlanUpdate, timestamp};
use crate::store::TestPlanStore;

fn to_active(p: &TestPlan) -> AppResult<test_plan::ActiveModel> {
    Ok(test_plan::ActiveModel {
        id: Set(p.id.clone()),
        project_id: Set(p.project_id.clone()),
        name: Set(p.name.clone()),
        start_date: Set(p.start_date),
        end_date: Set(p.end_date),
        cycles: Set(to_json(&p.cycles, "test_plans.cycles")?),
        created_at: Set(p.created_at),
        updated_at: Set(p.updated_at),
    })
}

fn to_domain(model: test_plan::Model) -> AppResult<TestPlan> {
    Ok(TestPlan {
        cycles: from_json(model.cycles, "test_plans.cycles")?,
        id: model.id,
        project_id: model.project_id,
        name: model.name,
        start_date: model.start_date,
        end_date: model.end_date,
        total_cases: 0,
        quality_score: 0.0,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

#[async_trait]
impl TestPlanStore for DbPool {
    async fn create_test_plan(&self, plan: &TestPlan) -> AppResult<TestPlan> {
        TestPlanEntity::insert(to_active(plan)?)
            .exec_without_returning(self.connection())
            .await
            .map_err(db_error("insert test plan"))?;
        Ok(plan.clone())
    }

    async fn get_test_plan(&self, id: &str) -> AppResult<Option<TestPlan>> {
        TestPlanEntity::find_by_id(id.to_string())
            .one(self.connection())
            .await
            .map_err(db_error("get test plan"))?
            .map(to_domain)
            .transpose()
    }

    async fn list_test_plans(&self) -> AppResult<Vec<TestPlan>> {
        TestPlanEntity::find()
            .order_by_asc(test_plan::Column::CreatedAt)
            .order_by_asc(test_plan::Column::Id)
            .all(self.connection())
            .await
            .map_err(db_error("list test plans"))?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn list_test_plans_by_project(&self, project_id: &str) -> AppResult<Vec<TestPlan>> {
        TestPlanEntity::find()
            .filter(test_plan::Column::ProjectId.eq(project_id))
            .order_by_asc(test_plan::Column::CreatedAt)
            .all(self.connection())
            .await
            .map_err(db_error("list test plans by project"))?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    async fn update_test_plan(
        &self,
        id: &str,
        update: &TestPlanUpdate,
    ) -> AppResult<Option<TestPlan>> {
        let Some(mut plan) = self.get_test_plan(id).await? else {
            return Ok(None);
        };
        update.apply(&mut plan, timestamp())?;

        TestPlanEntity::update_many()
            .set(to_active(&plan)?)
            .filter(test_plan::Column::Id.eq(id))
            .exec(self.connection())
            .await
            .map_err(db_error("update test plan"))?;

        Ok(Some(plan))
    }

    async fn delete_test_plan(&self, id: &str) -> AppResult<bool> {
        let result = TestPlanEntity::delete_by_id(id.to_string())
            .exec(self.connection())
            .await
            .map_err(db_error("delete test plan"))?;
        Ok(result.rows_affected > 0)
    }

    async fn put_test_plan(&self, plan: &TestPlan) -> AppResult<()> {
        let txn = self.connection().begin().await.map_err(db_error("begin transaction"))?;
        TestPlanEntity::delete_by_id(plan.id.clone())
            .exec(&txn)
            .await
            .map_err(db_error("replace test plan"))?;
        TestPlanEntity::insert(to_active(plan)?)
            .exec_without_returning(&txn)
            .await
            .map_err(db_error("insert test plan"))?;
        txn.commit().await.map_err(db_error("commit test plan"))?;
        Ok(())
    }
}
