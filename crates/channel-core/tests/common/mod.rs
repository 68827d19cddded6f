//! Shared session fixtures

#![allow(dead_code)]

/// Video access node re-sourcing the primary onto 224.1.2.1
pub const SOURCE: &str = "v=0
o=- 2001 3 IN IP4 10.1.1.1
s=Source channel
t=0 0
a=rtcp-unicast:rsi
a=group:FID 2 3
m=video 50000 RTP/AVPF 96
c=IN IP4 224.1.1.1/255
b=AS:5500
a=recvonly
a=rtpmap:96 MP2T/90000
a=rtcp:50001 IN IP4 10.3.3.3
a=source-filter: incl IN IP4 224.1.1.1 10.2.2.2
a=mid:1
a=rtcp-fb:96 nack
m=video 51000 RTP/AVPF 97
c=IN IP4 224.1.2.1/255
a=sendonly
a=rtpmap:97 MP2T/90000
a=source-filter: incl IN IP4 224.1.2.1 10.3.3.3
a=mid:2
m=video 52000 RTP/AVPF 99
c=IN IP4 10.3.3.3
a=sendonly
a=rtpmap:99 rtx/90000
a=rtcp:52001
a=mid:3
a=fmtp:99 apt=97;rtx-time=3000
";

/// Video access node repairing the primary directly
pub const LOOKASIDE: &str = "v=0
o=- 1001 7 IN IP4 10.1.1.1
s=Lookaside channel
t=0 0
a=group:FID 1 2
m=video 50000 RTP/AVPF 96
c=IN IP4 224.1.1.1/255
b=AS:5500
a=recvonly
a=rtpmap:96 MP2T/90000
a=rtcp:50001 IN IP4 10.1.1.1
a=source-filter: incl IN IP4 224.1.1.1 10.2.2.2
a=mid:1
a=rtcp-fb:96 nack
a=rtcp-fb:96 nack pli
a=rtcp-xr:pkt-loss-rle=1024 post-repair-loss-rle multicast-acq stat-summary=loss,dup,jitt
a=rtcp-rsize
m=video 50002 RTP/AVPF 99
c=IN IP4 10.1.1.1
a=sendonly
a=rtpmap:99 rtx/90000
a=rtcp:50003
a=mid:2
a=fmtp:99 apt=96;rtx-time=2500
a=rtcp-xr:pkt-loss-rle stat-summary=loss
";

/// Set-top receiver with two-dimensional FEC on the primary group
pub const FEC: &str = "v=0
o=- 3001 1 IN IP4 10.1.1.1
s=FEC channel
t=0 0
a=group:FEC 1 4 5
m=video 50000 RTP/AVP 96
c=IN IP4 224.1.1.1/255
a=recvonly
a=rtpmap:96 MP2T/90000
a=source-filter: incl IN IP4 224.1.1.1 10.2.2.2
a=mid:1
m=video 50002 RTP/AVP 100
c=IN IP4 224.1.1.1/255
a=recvonly
a=rtpmap:100 parityfec/90000
a=source-filter: incl IN IP4 224.1.1.1 10.2.2.2
a=mid:4
m=video 50004 RTP/AVP 101
c=IN IP4 224.1.1.1/255
a=recvonly
a=rtpmap:101 parityfec/90000
a=source-filter: incl IN IP4 224.1.1.1 10.2.2.2
a=mid:5
";

/// Distribution source sending raw UDP
pub const DISTRIBUTION: &str = "v=0
o=headend 4001 1 IN IP4 10.9.9.9
s=Distribution
t=0 0
m=video 5500 udp 33
c=IN IP4 232.5.5.5/64
a=sendonly
a=source-filter: incl IN IP4 232.5.5.5 10.9.9.9
";

/// Minimal receive-only channel on `group:port`
pub fn simple(id: u32, version: u64, group: &str, port: u16) -> String {
    format!(
        "v=0\n\
         o=- {id} {version} IN IP4 10.1.1.1\n\
         s=Channel {id}\n\
         t=0 0\n\
         m=video {port} RTP/AVP 33\n\
         c=IN IP4 {group}/255\n\
         a=recvonly\n\
         a=source-filter: incl IN IP4 {group} 10.2.2.2\n"
    )
}

/// Join sessions into one document
pub fn document<S: AsRef<str>>(sessions: &[S]) -> String {
    sessions
        .iter()
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("--\n")
}
