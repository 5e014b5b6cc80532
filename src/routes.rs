// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! The portal's destinations and the access each one requires.
//!
//! Tables are written the way the portal frontend declares its routes: nested
//! records whose child paths are relative to the parent, and whose `meta`
//! carries the access requirements. A child is entered through its parent, so
//! it inherits everything the parent requires.

use std::{collections::HashSet, io};

use serde::Deserialize;

use crate::{
    error::{self, Result},
    guard::{Redirect, Requirements},
};

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(crate) struct Route {
    pub(crate) path: String,
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default, rename = "meta")]
    pub(crate) requirements: Requirements,
    #[serde(default)]
    pub(crate) redirect: Option<String>,
    #[serde(default)]
    pub(crate) children: Vec<Route>,
}

impl Route {
    fn new(path: &str, name: &str, requirements: Requirements) -> Self {
        Self {
            path: path.to_owned(),
            name: Some(name.to_owned()),
            requirements,
            redirect: None,
            children: vec![],
        }
    }

    fn redirect(path: &str, target: &str) -> Self {
        Self {
            path: path.to_owned(),
            name: None,
            requirements: Requirements::NONE,
            redirect: Some(target.to_owned()),
            children: vec![],
        }
    }

    fn with_children(mut self, children: Vec<Self>) -> Self {
        self.children = children;
        self
    }
}

/// A route flattened to its full path, with the requirements of every route
/// on the way to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Destination {
    pub(crate) name: Option<String>,
    pub(crate) path: String,
    pub(crate) requirements: Requirements,
    pub(crate) redirect: Option<String>,
}

impl Destination {
    /// The name if there is one, otherwise the path.
    pub(crate) fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.path)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableFile {
    login: String,
    default_authenticated: String,
    routes: Vec<Route>,
}

#[derive(Clone, Debug)]
pub(crate) struct RouteTable {
    destinations: Vec<Destination>,
    login: String,
    default_authenticated: String,
}

const MAX_REDIRECTS: usize = 16;

impl RouteTable {
    pub(crate) fn new(
        routes: &[Route],
        login: &str,
        default_authenticated: &str,
    ) -> Result<Self, error::Route> {
        let mut destinations = vec![];
        for route in routes {
            flatten(route, "", Requirements::NONE, &mut destinations);
        }

        let mut names = HashSet::new();
        for name in destinations.iter().filter_map(|dest| dest.name.as_ref()) {
            if !names.insert(name) {
                return Err(error::Route::DuplicateName(name.clone()));
            }
        }

        let mut paths = HashSet::new();
        for path in destinations.iter().map(|dest| &dest.path) {
            if !paths.insert(path) {
                return Err(error::Route::DuplicatePath(path.clone()));
            }
        }

        let table = Self {
            destinations,
            login: login.to_owned(),
            default_authenticated: default_authenticated.to_owned(),
        };
        let _ = table.find(login)?;
        let _ = table.find(default_authenticated)?;
        Ok(table)
    }

    /// The destinations of the administrative portal.
    pub(crate) fn portal() -> Result<Self, error::Route> {
        Self::new(
            &[
                Route::new("/login", "Login", Requirements::NONE),
                Route::new("/apps", "Apps", Requirements::AUTHENTICATED),
                Route::new("/admin", "AdminDashboard", Requirements::PRIVILEGED).with_children(
                    vec![
                        Route::new("users", "ManageUsers", Requirements::NONE),
                        Route::new("apps", "ManageWebApps", Requirements::NONE),
                        Route::new("roles", "ManageRoles", Requirements::NONE),
                    ],
                ),
                Route::redirect("/", "/apps"),
            ],
            "Login",
            "Apps",
        )
    }

    pub(crate) fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        let file: TableFile = serde_json::from_reader(reader)?;
        Ok(Self::new(&file.routes, &file.login, &file.default_authenticated)?)
    }

    pub(crate) fn destinations(&self) -> impl Iterator<Item = &Destination> {
        self.destinations.iter()
    }

    pub(crate) fn find(&self, name: &str) -> Result<&Destination, error::Route> {
        self.destinations
            .iter()
            .find(|dest| dest.name.as_deref() == Some(name))
            .ok_or_else(|| error::Route::UnknownName(name.to_owned()))
    }

    /// The destination a refused navigation is sent to.
    pub(crate) fn redirect_target(&self, redirect: Redirect) -> Result<&Destination, error::Route> {
        match redirect {
            Redirect::Login => self.find(&self.login),
            Redirect::DefaultAuthenticated => self.find(&self.default_authenticated),
        }
    }

    /// Finds the destination `path` leads to, following redirect records.
    pub(crate) fn resolve(&self, path: &str) -> Result<&Destination, error::Route> {
        let mut current = normalize(path);
        let mut visited = vec![];
        loop {
            let dest = self
                .destinations
                .iter()
                .find(|dest| dest.path == current)
                .ok_or_else(|| error::Route::NotFound(current.clone()))?;

            let Some(ref target) = dest.redirect else {
                return Ok(dest);
            };
            if visited.contains(&current) || visited.len() >= MAX_REDIRECTS {
                return Err(error::Route::RedirectLoop(normalize(path)));
            }
            visited.push(current);
            current = normalize(target);
        }
    }
}

fn flatten(route: &Route, parent: &str, inherited: Requirements, out: &mut Vec<Destination>) {
    let path = if route.path.starts_with('/') {
        normalize(&route.path)
    } else {
        normalize(&format!("{parent}/{}", route.path))
    };
    let requirements = inherited | route.requirements;

    out.push(Destination {
        name: route.name.clone(),
        path: path.clone(),
        requirements,
        redirect: route.redirect.clone(),
    });
    for child in &route.children {
        flatten(child, &path, requirements, out);
    }
}

/// Drops any query or fragment and collapses empty segments, so `/admin/`,
/// `admin` and `/admin?tab=1` all name the same place.
fn normalize(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn portal() -> RouteTable {
        RouteTable::portal().unwrap_or_else(|e| panic!("portal routes should be valid: {e}"))
    }

    #[test]
    fn children_inherit_requirements() -> Result<(), error::Route> {
        let table = portal();
        let dest = table.resolve("/admin/roles")?;
        assert_eq!(dest.name.as_deref(), Some("ManageRoles"));
        assert_eq!(dest.requirements, Requirements::PRIVILEGED);
        Ok(())
    }

    #[test]
    fn root_redirects_to_apps() -> Result<(), error::Route> {
        let table = portal();
        let dest = table.resolve("/")?;
        assert_eq!(dest.label(), "Apps");
        assert_eq!(dest.requirements, Requirements::AUTHENTICATED);
        Ok(())
    }

    #[test]
    fn paths_are_normalized() -> Result<(), error::Route> {
        let table = portal();
        assert_eq!(table.resolve("admin//users/")?.label(), "ManageUsers");
        assert_eq!(table.resolve("/login?next=/apps")?.label(), "Login");
        assert_eq!(table.resolve("/login")?.requirements, Requirements::NONE);
        Ok(())
    }

    #[test]
    fn unknown_path_is_not_found() {
        assert_eq!(
            portal().resolve("/nowhere").map(Destination::label),
            Err(error::Route::NotFound("/nowhere".to_owned()))
        );
    }

    #[test]
    fn redirect_targets_exist() -> Result<(), error::Route> {
        let table = portal();
        assert_eq!(table.redirect_target(Redirect::Login)?.path, "/login");
        assert_eq!(
            table.redirect_target(Redirect::DefaultAuthenticated)?.path,
            "/apps"
        );
        Ok(())
    }

    #[test]
    fn duplicate_names_rejected() {
        let result = RouteTable::new(
            &[
                Route::new("/login", "Login", Requirements::NONE),
                Route::new("/other", "Login", Requirements::NONE),
            ],
            "Login",
            "Login",
        );
        assert_eq!(
            result.map(|_| ()),
            Err(error::Route::DuplicateName("Login".to_owned()))
        );
    }

    #[test]
    fn duplicate_paths_rejected() {
        let result = RouteTable::new(
            &[
                Route::new("/login", "Login", Requirements::NONE),
                Route::new("/admin", "Admin", Requirements::PRIVILEGED)
                    .with_children(vec![Route::new("users", "AdminUsers", Requirements::NONE)]),
                Route::new("/admin/users/", "Users", Requirements::AUTHENTICATED),
            ],
            "Login",
            "Login",
        );
        assert_eq!(
            result.map(|_| ()),
            Err(error::Route::DuplicatePath("/admin/users".to_owned()))
        );
    }

    #[test]
    fn missing_default_rejected() {
        let result = RouteTable::new(
            &[Route::new("/login", "Login", Requirements::NONE)],
            "Login",
            "Apps",
        );
        assert_eq!(
            result.map(|_| ()),
            Err(error::Route::UnknownName("Apps".to_owned()))
        );
    }

    #[test]
    fn redirect_loop_detected() -> Result<(), error::Route> {
        let table = RouteTable::new(
            &[
                Route::new("/login", "Login", Requirements::NONE),
                Route::redirect("/a", "/b"),
                Route::redirect("/b", "/a"),
            ],
            "Login",
            "Login",
        )?;
        assert_eq!(
            table.resolve("/a").map(Destination::label),
            Err(error::Route::RedirectLoop("/a".to_owned()))
        );
        Ok(())
    }

    #[test]
    fn loads_frontend_style_table() -> crate::error::Result<()> {
        let json = r#"{
            "login": "Login",
            "defaultAuthenticated": "Home",
            "routes": [
                { "path": "/login", "name": "Login" },
                { "path": "/home", "name": "Home", "meta": { "requiresAuth": true } },
                {
                    "path": "/admin",
                    "name": "Admin",
                    "meta": { "requiresAuth": true, "requiresAdmin": true },
                    "children": [{ "path": "audit", "name": "Audit" }]
                }
            ]
        }"#;

        let table = RouteTable::from_reader(json.as_bytes())?;
        assert_eq!(
            table.resolve("/admin/audit")?.requirements,
            Requirements::PRIVILEGED
        );
        assert_eq!(table.destinations().count(), 4);
        Ok(())
    }
}
