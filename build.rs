use shadow_rs::ShadowBuilder;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // build metadata for `--version`
    ShadowBuilder::builder().build()?;
    Ok(())
}
