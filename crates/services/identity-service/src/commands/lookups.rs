use domain::LookupKind;

use super::CommandResult;
use crate::service::IdentityService;

/// Print every lookup table as `value  name` lines.
pub async fn print_lookups(service: &dyn IdentityService) -> CommandResult {
    for kind in LookupKind::ALL {
        println!("{}:", kind.table_label());
        for (value, name) in service.lookup_list(kind).await? {
            println!("  {:>4}  {}", value, name);
        }
    }
    Ok(())
}
