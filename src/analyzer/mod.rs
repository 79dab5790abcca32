mod client;
pub mod transport;

pub use client::AnalysisClient;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

use crate::error::Result;
use crate::ingest::{DecodedImage, UploadedImage};
use leaf_doctor_common::{AnalysisRecord, Diagnosis, LEAF_ANALYSIS_INSTRUCTION};

/// 1回の診断: デコード確認 → Base64 → 解析
///
/// `structured` の場合はJSONモードで薬剤・信頼度も受け取る
pub async fn diagnose<T: Transport>(
    client: &AnalysisClient<T>,
    upload: &UploadedImage,
    structured: bool,
) -> Result<(DecodedImage, Diagnosis)> {
    let decoded = upload.decode()?;
    let encoded = upload.encoded();
    let mime_type = decoded.mime_type();

    let diagnosis = if structured {
        client.diagnose_structured(&encoded, mime_type).await?
    } else {
        let analysis = client.analyze(&encoded, mime_type, LEAF_ANALYSIS_INSTRUCTION).await?;
        Diagnosis {
            analysis,
            ..Default::default()
        }
    };

    Ok((decoded, diagnosis))
}

/// 保存用レコードを組み立てる
pub fn build_record(
    upload: &UploadedImage,
    decoded: &DecodedImage,
    diagnosis: &Diagnosis,
    analyzed_at: &str,
) -> AnalysisRecord {
    AnalysisRecord {
        file_name: upload.file_name.clone(),
        mime_type: decoded.mime_type().to_string(),
        width: decoded.width,
        height: decoded.height,
        analysis: diagnosis.analysis.clone(),
        medicines: diagnosis.medicines.clone(),
        confidence: diagnosis.confidence,
        analyzed_at: analyzed_at.to_string(),
    }
}
