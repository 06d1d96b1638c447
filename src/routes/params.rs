use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::entity::sea_orm_active_enums::{AppointmentStatus, UserRole};

/// Page/limit pair after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    pub fn normalize(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Self {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(default_limit).clamp(1, 100);
        let offset = (page - 1).saturating_mul(limit);
        Self {
            page,
            limit,
            offset,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AppointmentListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<AppointmentStatus>,
    /// Inclusive lower bound on `appointment_date`.
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on `appointment_date`.
    pub end_date: Option<NaiveDate>,
}

impl AppointmentListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::normalize(self.page, self.limit, 20)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ServiceListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Admins may list inactive services; public callers only see active ones.
    pub is_active: Option<bool>,
}

impl ServiceListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::normalize(self.page, self.limit, 50)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub role: Option<UserRole>,
}

impl UserListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::normalize(self.page, self.limit, 20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        let p = Pagination::normalize(None, None, 20);
        assert_eq!(p, Pagination { page: 1, limit: 20, offset: 0 });

        let p = Pagination::normalize(Some(0), Some(500), 20);
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 100);

        let p = Pagination::normalize(Some(3), Some(10), 20);
        assert_eq!(p.offset, 20);
    }

    #[test]
    fn huge_page_saturates_offset() {
        let p = Pagination::normalize(Some(i64::MAX), Some(100), 20);
        assert_eq!(p.page, i64::MAX);
        assert_eq!(p.offset, i64::MAX);
    }

    #[test]
    fn service_listing_defaults_to_fifty() {
        assert_eq!(ServiceListQuery::default().pagination().limit, 50);
    }
}
