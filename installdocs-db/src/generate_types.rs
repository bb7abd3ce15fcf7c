//! TypeScript type generation.
//!
//! Exports definitions for every record and input type annotated with
//! `#[ts(export)]` so the web client can share them. Runs as a test.

#[cfg(test)]
mod tests {
    use std::{env, path::Path};

    use ts_rs::TS;

    #[test]
    fn generate_typescript_types() {
        // INSTALLDOCS_TS_OUTPUT_DIR wins, otherwise ../ts-bindings
        let output_dir_str = env::var("INSTALLDOCS_TS_OUTPUT_DIR")
            .unwrap_or_else(|_| "../ts-bindings".to_string());
        let output_dir = Path::new(&output_dir_str);

        if !output_dir.exists() {
            std::fs::create_dir_all(output_dir).expect("Failed to create output directory");
        }

        // Remove stale definitions so renamed types do not linger
        for entry in std::fs::read_dir(output_dir).expect("Failed to read output directory") {
            let path = entry.expect("Failed to read directory entry").path();
            if path.extension().and_then(|s| s.to_str()) == Some("ts") {
                std::fs::remove_file(&path)
                    .unwrap_or_else(|e| panic!("Failed to remove {:?}: {}", path, e));
            }
        }

        unsafe {
            env::set_var("TS_RS_EXPORT_DIR", output_dir);
        }

        use crate::models::*;

        User::export().expect("Failed to export User type");
        UserInput::export().expect("Failed to export UserInput type");
        UserChanges::export().expect("Failed to export UserChanges type");
        Theme::export().expect("Failed to export Theme type");
        DisplayMode::export().expect("Failed to export DisplayMode type");

        EmailVerificationToken::export().expect("Failed to export EmailVerificationToken type");
        UserSession::export().expect("Failed to export UserSession type");
        UserSessionInput::export().expect("Failed to export UserSessionInput type");
        LoginAttempt::export().expect("Failed to export LoginAttempt type");
        NewLoginAttempt::export().expect("Failed to export NewLoginAttempt type");
        LoginAttemptFilter::export().expect("Failed to export LoginAttemptFilter type");

        Group::export().expect("Failed to export Group type");
        NewGroup::export().expect("Failed to export NewGroup type");
        UserGroup::export().expect("Failed to export UserGroup type");

        Building::export().expect("Failed to export Building type");
        BuildingInput::export().expect("Failed to export BuildingInput type");
        Device::export().expect("Failed to export Device type");
        DeviceInput::export().expect("Failed to export DeviceInput type");

        Ticket::export().expect("Failed to export Ticket type");
        TicketEntry::export().expect("Failed to export TicketEntry type");
        TicketEntryInput::export().expect("Failed to export TicketEntryInput type");
        TicketEntryChanges::export().expect("Failed to export TicketEntryChanges type");
        TicketEntryDevice::export().expect("Failed to export TicketEntryDevice type");
        TicketMiscEntry::export().expect("Failed to export TicketMiscEntry type");
        TicketMiscEntryInput::export().expect("Failed to export TicketMiscEntryInput type");
        TicketMiscEntryChanges::export().expect("Failed to export TicketMiscEntryChanges type");

        Notification::export().expect("Failed to export Notification type");
        NewNotification::export().expect("Failed to export NewNotification type");
        Alert::export().expect("Failed to export Alert type");
        NewAlert::export().expect("Failed to export NewAlert type");
        AlertFilter::export().expect("Failed to export AlertFilter type");
        Severity::export().expect("Failed to export Severity type");

        History::export().expect("Failed to export History type");
        NewHistory::export().expect("Failed to export NewHistory type");
        HistoryFilter::export().expect("Failed to export HistoryFilter type");
        DailyAlertCount::export().expect("Failed to export DailyAlertCount type");

        println!("TypeScript types generated successfully in {:?}", output_dir);
    }
}
