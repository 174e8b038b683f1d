fn main() -> anyhow::Result<()> {
    binaural_focus_lib::run()
}
