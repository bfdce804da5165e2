use aws_config::BehaviorVersion;
use aws_sdk_s3::Client as S3Client;
use aws_types::region::Region;
use log::info;

/// Builds an S3 client from the default AWS provider chain, optionally pinning the region.
pub async fn create_s3_client(region: Option<&str>) -> S3Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    let sdk_config = loader.load().await;
    info!(
        "S3 client ready (region: {})",
        sdk_config
            .region()
            .map(|r| r.as_ref().to_string())
            .unwrap_or_else(|| "unset".to_string())
    );
    S3Client::new(&sdk_config)
}
