//! # 流量分流路由模块
//!
//! 在负载均衡之前执行的 A/B 分流决策：按 (host, path) 线性扫描当前
//! 策略列表，命中 header 类型策略且请求头值匹配某个映射项时，返回
//! 替代的 upstream 组名，覆盖该请求的默认组选择。端点级选择仍由
//! 均衡器在最终选定的组内完成。
//!
//! 任何环节未命中（无策略、类型不支持、请求头缺失、值无映射）都不是
//! 错误，请求正常回落到默认组的负载均衡。

use hyper::header::HeaderMap;
use tracing::debug;

use crate::policy::{DiversionType, Policy};

/// 根据请求的 (host, path, headers) 做一次分流决策
///
/// 返回 `Some(组名)` 时调用方必须用它替换默认的后端组。
pub fn route(policies: &[Policy], host: &str, path: &str, headers: &HeaderMap) -> Option<String> {
    // 策略数量小，线性扫描取第一个 (host, path) 相等的策略
    let policy = policies
        .iter()
        .find(|p| p.host == host && p.path == path)?;

    // 未识别的分流类型不参与分流，留给未来的策略类型
    if policy.diversion_type() != DiversionType::Header {
        return None;
    }

    let header_name = normalize_header_name(&policy.header);
    let observed = headers.get(header_name.as_str())?.to_str().ok()?;

    let entry = policy
        .upstreams
        .iter()
        .find(|entry| entry.header == observed)?;

    debug!(
        host,
        path,
        header = %policy.header,
        value = %observed,
        upstream = %entry.upstream,
        "diversion matched"
    );
    Some(entry.upstream.clone())
}

/// 将配置的请求头名称规范化为入站头部的命名习惯：
/// 下划线替换为连字符，大小写交给 HeaderMap 的不敏感匹配。
fn normalize_header_name(name: &str) -> String {
    name.trim().replace('_', "-").to_ascii_lowercase()
}
