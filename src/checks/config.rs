use super::{CheckKind, CheckReport, Context};
use crate::npmrc::{NpmConfig, SettingState, RECOMMENDED_SETTINGS, REQUIRED_SETTINGS};

const MAX_NPMRC_BYTES: u64 = 256 * 1024;

/// Verifies the security-relevant settings in `.npmrc`.
///
/// A missing file only warns. Missing or wrong required settings fail the
/// check; recommended settings only warn.
pub fn check_configuration(ctx: &Context) -> CheckReport {
    let mut report = CheckReport::new(CheckKind::Configuration);
    let path = ctx.security_config_path();
    let name = ctx.display_name(&path);

    let text = match crate::fs_guard::read_optional(&path, MAX_NPMRC_BYTES) {
        Ok(Some(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
        Ok(None) => {
            report.warn(format!(
                "{name} not found; npm defaults allow install scripts to run"
            ));
            return report;
        }
        Err(e) => {
            report.fail(e.to_string());
            return report;
        }
    };
    let config = NpmConfig::parse(&text);

    for setting in REQUIRED_SETTINGS {
        let wanted = setting.accepted.join("|");
        match config.check(setting) {
            SettingState::Satisfied => report.info(format!(
                "{}={} ({})",
                setting.key,
                config.get(setting.key).unwrap_or_default(),
                setting.purpose
            )),
            SettingState::Missing => report.fail(format!(
                "required setting missing: {}={wanted} ({})",
                setting.key, setting.purpose
            )),
            SettingState::Mismatched(actual) => report.fail(format!(
                "required setting {}={actual}, expected {wanted}",
                setting.key
            )),
        }
    }

    for setting in RECOMMENDED_SETTINGS {
        let wanted = setting.accepted.join("|");
        match config.check(setting) {
            SettingState::Satisfied => {}
            SettingState::Missing => report.warn(format!(
                "recommended setting missing: {}={wanted} ({})",
                setting.key, setting.purpose
            )),
            SettingState::Mismatched(actual) => report.warn(format!(
                "recommended setting {}={actual}, expected {wanted}",
                setting.key
            )),
        }
    }

    report
}
