//! Human-readable terminal renderer.

use daybook_common::Service;
use owo_colors::OwoColorize as _;

use crate::application::services::PullSummary;
use crate::domain::PatternEntry;
use crate::output::OutputContext;

/// Renders results as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    pub fn render_pull(&self, summary: &PullSummary) {
        if summary.services.is_empty() {
            return;
        }
        let totals = summary.totals();
        println!();
        self.ctx.header(&format!("Pulled for {}", summary.host));
        self.ctx.kv("Services: ", &summary.services.join(", "));
        self.ctx.kv("Artifacts:", &summary.artifacts.len().to_string());
        self.ctx.kv(
            "Files:    ",
            &format!("{} ({} directories)", totals.files, totals.directories),
        );
    }

    pub fn render_push(&self, service: &Service, key: &str, size: u64, sha256: &str) {
        self.ctx.success(&format!(
            "Stored {} as {key}",
            service.to_string().style(self.ctx.styles.service)
        ));
        self.ctx.kv("Size:  ", &format!("{size} bytes"));
        self.ctx.kv("SHA256:", sha256);
    }

    pub fn render_services(&self, pattern: &str, services: Option<&[String]>) {
        let pattern_styled = pattern.style(self.ctx.styles.pattern);
        match services {
            None => self
                .ctx
                .warn(&format!("No entry for {pattern_styled}; nothing changed")),
            Some([]) => self.ctx.info(&format!("{pattern_styled} maps to no services")),
            Some(services) => {
                if self.ctx.quiet {
                    return;
                }
                println!("  {pattern_styled}:");
                for name in services {
                    println!("    {}", name.style(self.ctx.styles.service));
                }
            }
        }
    }

    pub fn render_entries(&self, entries: &[PatternEntry]) {
        if self.ctx.quiet {
            return;
        }
        if entries.is_empty() {
            println!("No patterns registered. Add one: daybook map add <pattern> <service>...");
            return;
        }
        let width = entries.iter().map(|e| e.pattern.len()).max().unwrap_or(0);
        for entry in entries {
            let services = if entry.services.is_empty() {
                "(none)".style(self.ctx.styles.dim).to_string()
            } else {
                entry.services.join(", ")
            };
            println!(
                "  {}  {services}",
                format!("{:<width$}", entry.pattern).style(self.ctx.styles.pattern)
            );
        }
    }

    pub fn render_resolution(&self, host: &str, services: &[Service]) {
        if services.is_empty() {
            self.ctx.warn(&format!("No pattern matches host {host}"));
            return;
        }
        let names: Vec<&str> = services.iter().map(|s| s.name.as_str()).collect();
        self.ctx.kv(&format!("{host}:"), &names.join(", "));
    }

    pub fn render_versions(&self, name: &str, versions: &[Service]) {
        if versions.is_empty() {
            self.ctx.warn(&format!("No artifacts stored for {name}"));
            return;
        }
        if self.ctx.quiet {
            return;
        }
        println!("  {}:", name.style(self.ctx.styles.service));
        for version in versions.iter().filter_map(Service::version) {
            println!("    {version}");
        }
    }
}
