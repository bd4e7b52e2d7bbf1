fn main() -> anyhow::Result<()> {
    vnsentiment_lib::run()
}
