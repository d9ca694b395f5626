//! Resource references
//!
//! A `ResourceRef` pins down one namespaced object by its API coordinates.
//! It is the only thing a watch or lifecycle call needs to locate a resource.

use kube::Resource;
use kube::discovery::ApiResource;
use std::fmt;

/// Identifies a namespaced resource: group, version, plural, namespace, name.
///
/// Core-group kinds (pods, secrets) use an empty group. Fields are private so
/// a reference cannot change once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    group: String,
    version: String,
    plural: String,
    namespace: String,
    name: String,
}

impl ResourceRef {
    /// Create a reference from explicit API coordinates
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        plural: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            plural: plural.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Create a reference for a statically typed kind (CRD or k8s-openapi type)
    ///
    /// ```
    /// use k8s_openapi::api::batch::v1::Job;
    /// use resource_client::ResourceRef;
    ///
    /// let job = ResourceRef::of::<Job>("pg-test", "j-runtprocc");
    /// assert_eq!(job.api_version(), "batch/v1");
    /// assert_eq!(job.plural(), "jobs");
    /// ```
    pub fn of<K>(namespace: impl Into<String>, name: impl Into<String>) -> Self
    where
        K: Resource<DynamicType = ()>,
    {
        Self::new(
            K::group(&()),
            K::version(&()),
            K::plural(&()),
            namespace,
            name,
        )
    }

    /// Same coordinates, different object name
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// API group; empty for the core group
    pub fn group(&self) -> &str {
        &self.group
    }

    /// API version, e.g. `v1`
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Plural resource name used in URLs
    pub fn plural(&self) -> &str {
        &self.plural
    }

    /// Namespace of the object
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Object name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `group/version`, or just `version` for the core group
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Dynamic API resource used to build `Api<DynamicObject>` handles.
    ///
    /// Only the URL relevant coordinates are known here, so `kind` is left empty;
    /// request bodies carry their own `kind`.
    pub fn api_resource(&self) -> ApiResource {
        ApiResource {
            group: self.group.clone(),
            version: self.version.clone(),
            api_version: self.api_version(),
            kind: String::new(),
            plural: self.plural.clone(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}/{}/{}", self.plural, self.api_version(), self.namespace, self.name)
    }
}
