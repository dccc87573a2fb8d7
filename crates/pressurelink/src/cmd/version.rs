use pressurelink_frame::{Revision, WireRevision};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("pressurelink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: pressurelink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("PRESSURELINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "build_profile: {}",
        option_env!("PRESSURELINK_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "wire_revisions: {}, {} (default {})",
        Revision::Legacy.name(),
        Revision::Current.name(),
        Revision::default().name()
    );
    println!(
        "features: async={}, cli=true, serial={}",
        cfg!(feature = "async"),
        cfg!(unix)
    );

    Ok(SUCCESS)
}
