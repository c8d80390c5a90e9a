//! REST implementation of [`AdminApi`]

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use super::{AdminApi, ApiError, HttpClient};
use crate::types::{
    BulkIncrease, Employee, EmployeeState, IncomeChannel, IncreaseScope, NewPriceEntry, Plan,
    PlanDraft, PriceEntry, Role,
};

#[derive(Debug, Deserialize)]
struct CreatedPlan {
    #[serde(rename = "planId", alias = "id")]
    plan_id: u64,
}

#[derive(Debug, Serialize)]
struct RoleUpdate {
    rol: Role,
    supervisor_id: Option<u64>,
}

pub struct RestAdminApi {
    http: HttpClient,
}

impl RestAdminApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl AdminApi for RestAdminApi {
    async fn employees(&self, cancel: &CancellationToken) -> Result<Vec<Employee>, ApiError> {
        self.http.require_session()?;
        self.http.get_json("/employees", cancel).await
    }

    async fn update_employee_role(
        &self,
        legajo: u64,
        rol: Role,
        supervisor_id: Option<u64>,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        self.http.require_session()?;
        let body = RoleUpdate { rol, supervisor_id };
        let _: Value = self
            .http
            .put_json(&format!("/employees/{}", legajo), &body, cancel)
            .await?;
        Ok(())
    }

    async fn set_employee_status(
        &self,
        legajo: u64,
        estado: EmployeeState,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        self.http.require_session()?;
        let _: Value = self
            .http
            .put_json(
                &format!("/employees/{}", legajo),
                &json!({ "estado": estado }),
                cancel,
            )
            .await?;
        Ok(())
    }

    async fn plans(&self, cancel: &CancellationToken) -> Result<Vec<Plan>, ApiError> {
        self.http.require_session()?;
        self.http.get_json("/plans", cancel).await
    }

    async fn create_plan(
        &self,
        draft: &PlanDraft,
        cancel: &CancellationToken,
    ) -> Result<u64, ApiError> {
        self.http.require_session()?;
        let created: CreatedPlan = self.http.post_json("/plans", draft, cancel).await?;
        Ok(created.plan_id)
    }

    async fn update_plan(
        &self,
        id: u64,
        draft: &PlanDraft,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        self.http.require_session()?;
        let _: Value = self
            .http
            .put_json(&format!("/plans/{}", id), draft, cancel)
            .await?;
        Ok(())
    }

    async fn deactivate_plan(&self, id: u64, cancel: &CancellationToken) -> Result<(), ApiError> {
        self.http.require_session()?;
        self.http.delete(&format!("/plans/{}", id), cancel).await
    }

    async fn price_list(
        &self,
        plan_id: u64,
        channel: IncomeChannel,
        cancel: &CancellationToken,
    ) -> Result<Vec<PriceEntry>, ApiError> {
        self.http.require_session()?;
        let path = format!(
            "/pricelists/plan/{}/{}",
            plan_id,
            channel.price_list_channel().wire_name()
        );
        self.http.get_json(&path, cancel).await
    }

    async fn bulk_load_prices(
        &self,
        entries: &[NewPriceEntry],
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        self.http.require_session()?;
        let _: Value = self.http.post_json("/pricelists", entries, cancel).await?;
        Ok(())
    }

    async fn update_price(
        &self,
        id: u64,
        precio: Decimal,
        rango_etario: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        self.http.require_session()?;
        let body = json!({ "precio": precio, "rango_etario": rango_etario });
        let _: Value = self
            .http
            .put_json(&format!("/pricelists/{}", id), &body, cancel)
            .await?;
        Ok(())
    }

    async fn delete_price(&self, id: u64, cancel: &CancellationToken) -> Result<(), ApiError> {
        self.http.require_session()?;
        self.http
            .delete(&format!("/pricelists/{}", id), cancel)
            .await
    }

    async fn bulk_increase(
        &self,
        porcentaje: Decimal,
        scope: IncreaseScope,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        self.http.require_session()?;
        let body = BulkIncrease {
            porcentaje,
            tipo_ingreso: scope,
        };
        let _: Value = self
            .http
            .post_json("/pricelists/increase", &body, cancel)
            .await?;
        Ok(())
    }
}
