use super::context::AppContext;
use super::release::ReleaseInfo;
use prettytable::{row, Table};

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

fn gib(bytes: u64) -> String {
    if bytes == 0 {
        "Unknown".to_string()
    } else {
        format!("{:.2} GB", bytes as f64 / GIB)
    }
}

pub struct View {}

impl View {
    pub fn system_info_table(ctx: &AppContext) -> Table {
        let system = &ctx.system;
        let mut table = Table::new();

        table.add_row(row!["APPLICATION", format!("{} {}", ctx.app_name, ctx.version_tag)]);
        table.add_row(row!["UPDATER", &ctx.package_version]);
        table.add_row(row!["OS", &ctx.display_os]);
        table.add_row(row!["KERNEL", &system.kernel_version]);
        table.add_row(row!["ARCH", &system.arch]);
        table.add_row(row!["CPU", format!("{} ({} cores)", system.cpu, system.cpu_cores)]);
        table.add_row(row!["RAM", gib(system.total_memory)]);
        table.add_row(row!["DISK", format!("{} total, {} free", gib(system.disk_total), gib(system.disk_free))]);
        table.add_row(row!["DIRECTORY", ctx.current_dir.display()]);
        table.add_row(row!["LOG", ctx.log_path.display()]);
        table
    }

    pub fn system_info(ctx: &AppContext) {
        Self::system_info_table(ctx).printstd();
    }

    pub fn release(release: &ReleaseInfo) {
        let mut table = Table::new();
        table.add_row(row!["TAG", "CHANNEL", "ASSET", "PUBLISHED"]);
        table.add_row(row![
            release.version_tag,
            if release.prerelease { "pre-release" } else { "stable" },
            release.asset_name,
            release.published_at
        ]);
        table.printstd();
    }
}
