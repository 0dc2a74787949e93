mod command;
mod persona;
mod util;

fn main() -> anyhow::Result<()> {
    command::run()
}
