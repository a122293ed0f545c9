//! Templating for node specs
//!
//! Node types carry a template body that is rendered once per node with the
//! instance and node values in scope, then decoded into a workload spec.
//!
//! ```text
//! containers:
//!   - name: {{ node.name }}
//!     image: {{ node.image }}:{{ node.version }}
//!     ports:
//!     {% for p in node.ports %}
//!       - containerPort: {{ p.port }}
//!         protocol: {{ p.protocol }}
//!     {% endfor %}
//! ```
//!
//! Filters beyond the minijinja builtins: `quote` (YAML-safe string scalar)
//! and `required` (fail on an empty value).

mod context;
mod engine;
mod error;

pub use context::{InstanceContext, NodeContext, PortContext, TemplateContext};
pub use engine::TemplateEngine;
pub use error::TemplateError;
