//! Course branding and scheduling context.

use diesel::prelude::*;
use serde::Serialize;

use crate::schema::courses;

/// Read-only course record; supplies notification branding and the
/// timezone that defines the course's calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Serialize)]
#[diesel(table_name = courses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Course {
    pub id: String,
    pub name: String,
    pub subdomain: String,
    pub logo_url: Option<String>,
    pub timezone: String,
}

/// The branding subset handed to notification providers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branding {
    pub course_name: String,
    pub subdomain: String,
    pub logo_url: Option<String>,
}

impl From<&Course> for Branding {
    fn from(course: &Course) -> Self {
        Self {
            course_name: course.name.clone(),
            subdomain: course.subdomain.clone(),
            logo_url: course.logo_url.clone(),
        }
    }
}
