mod cmdline;
mod driver;

use wiresched_utils::SchedResult;

fn main() -> SchedResult<()> {
    driver::run_scheduler()
}
